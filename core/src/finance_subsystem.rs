//! Yearly finance processing: salary deposit, cost of living,
//! investment returns and loan amortisation.
//!
//! Execution: every turn. Salary and living costs stop while the
//! character is incarcerated; investments and loans keep running.

use crate::{
    balancer::StatBalancer,
    character::Character,
    config::FinanceConfig,
    event::Chronicle,
    rng::{RandomSource, SubsystemSlot},
    stats::Stat,
    subsystem::{ActionResult, LifeSubsystem},
};
use serde::{Deserialize, Serialize};

pub const ADULT_AGE: u32 = 18;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub label: String,
    /// Outstanding balance in thousands.
    pub balance: i64,
    pub rate: f64,
    pub annual_payment: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Finances {
    /// Invested capital in thousands, outside of liquid wealth.
    pub investments: i64,
    pub loans: Vec<Loan>,
}

impl Finances {
    pub fn take_loan(&mut self, label: String, principal: i64, rate: f64, years: u32) {
        let years = years.max(1) as i64;
        let annual_payment = ((principal + years - 1) / years).max(1);
        self.loans.push(Loan { label, balance: principal, rate, annual_payment });
    }

    pub fn total_debt(&self) -> i64 {
        self.loans.iter().map(|l| l.balance).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FinanceAction {
    Invest { amount: i64 },
    Withdraw { amount: i64 },
}

pub struct FinanceSubsystem {
    config: FinanceConfig,
}

impl FinanceSubsystem {
    pub fn new(config: FinanceConfig) -> Self {
        Self { config }
    }

    pub fn apply_action(&self, character: &mut Character, action: FinanceAction) -> ActionResult {
        let mut log = Chronicle::new();
        match action {
            FinanceAction::Invest { amount } => {
                if amount <= 0 {
                    return ActionResult::rejected("Invest a positive amount.");
                }
                if character.stat(Stat::Wealth) < amount {
                    return ActionResult::rejected(format!("You don't have {amount}k to invest."));
                }
                StatBalancer::apply_one(character, Stat::Wealth, -amount);
                character.finances.investments += amount;
                log.narrate(format!("You invested {amount}k."));
            }
            FinanceAction::Withdraw { amount } => {
                if amount <= 0 {
                    return ActionResult::rejected("Withdraw a positive amount.");
                }
                if character.finances.investments < amount {
                    return ActionResult::rejected(format!("You don't have {amount}k invested."));
                }
                character.finances.investments -= amount;
                StatBalancer::apply_one(character, Stat::Wealth, amount);
                log.narrate(format!("You cashed out {amount}k of investments."));
            }
        }
        ActionResult::Applied(log)
    }

    fn service_loans(&self, character: &mut Character, log: &mut Chronicle) {
        let mut loans = std::mem::take(&mut character.finances.loans);
        for loan in &mut loans {
            let interest = (loan.balance as f64 * loan.rate).round() as i64;
            loan.balance += interest;
            let due = loan.annual_payment.min(loan.balance);
            let paid = due.min(character.stat(Stat::Wealth));
            StatBalancer::apply_one(character, Stat::Wealth, -paid);
            loan.balance -= paid;
            if paid < due {
                StatBalancer::apply_one(character, Stat::Happiness, self.config.missed_payment_happiness);
                log.narrate(format!("You couldn't cover the payment on your {}.", loan.label));
            } else if loan.balance == 0 {
                log.narrate(format!("You paid off your {}.", loan.label));
            }
        }
        loans.retain(|l| l.balance > 0);
        character.finances.loans = loans;
    }
}

impl LifeSubsystem for FinanceSubsystem {
    fn name(&self) -> &'static str {
        "finance"
    }

    fn slot(&self) -> SubsystemSlot {
        SubsystemSlot::Finance
    }

    fn runs_in_custody(&self) -> bool {
        true
    }

    fn advance(&self, character: &mut Character, rng: &mut dyn RandomSource, log: &mut Chronicle) {
        let age = character.age();

        if !character.is_in_prison() {
            if let Some(job) = character.career.employment() {
                let salary = job.salary;
                StatBalancer::apply_one(character, Stat::Wealth, salary);
            }
            if age >= ADULT_AGE {
                StatBalancer::apply_one(character, Stat::Wealth, -self.config.living_cost);
            }
        }

        if character.finances.investments > 0 {
            let rate = rng.range_f64(self.config.investment_return_min, self.config.investment_return_max);
            let change = (character.finances.investments as f64 * rate).round() as i64;
            character.finances.investments = (character.finances.investments + change).max(0);
            if change.abs() >= 5 {
                let verb = if change > 0 { "gained" } else { "lost" };
                log.narrate(format!("Your investments {verb} {}k this year.", change.abs()));
            }
        }

        if !character.finances.loans.is_empty() {
            self.service_loans(character, log);
        }

        log::debug!(
            "age={age} finance: wealth={} invested={} debt={}",
            character.stat(Stat::Wealth),
            character.finances.investments,
            character.finances.total_debt()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{character::Gender, rng::ScriptedRng, stats::Stats};

    #[test]
    fn loan_amortises_and_missed_payments_hurt() {
        let finance = FinanceSubsystem::new(FinanceConfig { living_cost: 0, ..FinanceConfig::default() });
        let mut c = Character::new("f".into(), "F".into(), 2000, Gender::Male, Stats::new(80, 50, 50, 50, 50, 3))
            .starting_at(30);
        c.finances.take_loan("car loan".into(), 20, 0.0, 2);
        let mut log = Chronicle::new();
        finance.advance(&mut c, &mut ScriptedRng::constant(0.5), &mut log);
        assert_eq!(c.stat(Stat::Wealth), 0);
        assert_eq!(c.finances.loans[0].balance, 17);
        assert_eq!(c.stat(Stat::Happiness), 48);
    }
}

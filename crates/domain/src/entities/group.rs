//! Player groups with a shared bank account and sample inventory.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{GroupId, SampleId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub bank_account: i64,
    #[serde(default)]
    pub samples: Vec<SampleId>,
}

impl Group {
    pub fn new(name: String) -> Self {
        Self {
            id: GroupId::new(),
            name,
            bank_account: 0,
            samples: Vec::new(),
        }
    }

    pub fn add_sample(&mut self, sample_id: SampleId) {
        if !self.samples.contains(&sample_id) {
            self.samples.push(sample_id);
        }
    }

    pub fn deposit(&mut self, amount: i64) -> Result<(), DomainError> {
        if amount < 0 {
            return Err(DomainError::validation("Deposit amount cannot be negative"));
        }
        self.bank_account += amount;
        Ok(())
    }

    pub fn withdraw(&mut self, amount: i64) -> Result<(), DomainError> {
        if amount < 0 {
            return Err(DomainError::validation(
                "Withdrawal amount cannot be negative",
            ));
        }
        if amount > self.bank_account {
            return Err(DomainError::InsufficientFunds {
                required: amount,
                available: self.bank_account,
            });
        }
        self.bank_account -= amount;
        Ok(())
    }
}

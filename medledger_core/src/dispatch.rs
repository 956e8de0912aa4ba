//! Name-based dispatch of invoke requests to record store operations.

use crate::{Error, Ledger, RecordStore, Result};
use std::fmt;
use std::str::FromStr;

/// Every operation a caller can invoke by name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Init,
    Read,
    Write,
    AddPatient,
    AddMedication,
    RemoveMedication,
    ReadRange,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::Init,
        Operation::Read,
        Operation::Write,
        Operation::AddPatient,
        Operation::AddMedication,
        Operation::RemoveMedication,
        Operation::ReadRange,
    ];

    /// The invoke name of this operation
    pub fn name(self) -> &'static str {
        match self {
            Operation::Init => "init",
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::AddPatient => "addPatient",
            Operation::AddMedication => "addMedication",
            Operation::RemoveMedication => "removeMedication",
            Operation::ReadRange => "readRange",
        }
    }

    /// Run this operation against `store`
    pub fn apply<L: Ledger>(self, store: &mut RecordStore<L>, args: &[String]) -> Result<Vec<u8>> {
        match self {
            Operation::Init => store.init(args),
            Operation::Read => store.read(args),
            Operation::Write => store.write(args),
            Operation::AddPatient => store.add_patient(args),
            Operation::AddMedication => store.add_medication(args),
            Operation::RemoveMedication => store.remove_medication(args),
            Operation::ReadRange => store.read_range(args),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| Error::UnknownFunction(s.to_string()))
    }
}

impl<L: Ledger> RecordStore<L> {
    /// Resolve `function` and run it with `args`
    pub fn invoke(&mut self, function: &str, args: &[String]) -> Result<Vec<u8>> {
        let op = function.parse::<Operation>().inspect_err(|_| {
            tracing::warn!("Received unknown invoke function name - {}", function);
        })?;

        tracing::info!("starting invoke, for - {} ({} args)", op, args.len());
        let result = op.apply(self, args);
        if let Err(ref e) = result {
            tracing::warn!("{} failed: {}", op, e);
        }
        result
    }
}

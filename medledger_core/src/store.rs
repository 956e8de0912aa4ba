//! Record store operations over a ledger.
//!
//! Every operation takes positional string arguments and returns the raw
//! success payload. Mutations are a single read-modify-write of one key.

use crate::{Error, Ledger, Medication, Patient, Result};

/// UI version written by `init` when none is configured
pub const DEFAULT_UI_VERSION: &str = "1.0.0";

/// Key holding the compatible UI version
pub const UI_VERSION_KEY: &str = "hl3_ui";

/// Key holding the `init` self-test value
pub const SELFTEST_KEY: &str = "selftest";

/// Patient and medication operations bound to one ledger handle
#[derive(Debug)]
pub struct RecordStore<L> {
    ledger: L,
    ui_version: String,
}

impl<L: Ledger> RecordStore<L> {
    pub fn new(ledger: L) -> Self {
        Self {
            ledger,
            ui_version: DEFAULT_UI_VERSION.to_string(),
        }
    }

    pub fn with_ui_version(mut self, version: impl Into<String>) -> Self {
        self.ui_version = version.into();
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// `(n)`: record the UI version and a numeric self-test value
    pub fn init(&mut self, args: &[String]) -> Result<Vec<u8>> {
        expect_exactly(args, 1, "Expecting 1")?;
        sanitize_arguments(args)?;
        let value: i64 = args[0].parse().map_err(|_| {
            Error::InvalidArguments("Expecting a numeric string argument to init".into())
        })?;

        self.ledger.put(UI_VERSION_KEY, self.ui_version.as_bytes())?;
        self.ledger.put(SELFTEST_KEY, value.to_string().as_bytes())?;
        tracing::info!("Initialized store (ui_version {})", self.ui_version);
        Ok(Vec::new())
    }

    /// `(key)`: stored bytes, verbatim
    pub fn read(&self, args: &[String]) -> Result<Vec<u8>> {
        expect_exactly(args, 1, "Expecting key of the var to query")?;
        sanitize_arguments(args)?;

        let key = &args[0];
        self.ledger
            .get(key)?
            .ok_or_else(|| Error::NotFound(key.clone()))
    }

    /// `(key, value)`: raw put
    pub fn write(&mut self, args: &[String]) -> Result<Vec<u8>> {
        expect_exactly(
            args,
            2,
            "Expecting 2. key of the variable and value to set",
        )?;
        sanitize_arguments(args)?;

        self.ledger.put(&args[0], args[1].as_bytes())?;
        Ok(Vec::new())
    }

    /// `(sourceId, firstName, lastName, dateOfBirth, sex, phoneNumber)`:
    /// store a new patient, overwriting any record already at `sourceId`
    pub fn add_patient(&mut self, args: &[String]) -> Result<Vec<u8>> {
        let patient = Patient::from_args(args)?;
        let bytes = patient.encode()?;
        self.ledger.put(&patient.source_id, &bytes)?;
        tracing::info!("Stored patient {}", patient.source_id);
        Ok(Vec::new())
    }

    /// `(sourceId, medName, count, dosage, fillDate, form, quantity,
    /// fillLoc, prescriber)`: append a medication to the patient's list
    pub fn add_medication(&mut self, args: &[String]) -> Result<Vec<u8>> {
        let (source_id, fields) = args.split_first().ok_or_else(|| {
            Error::InvalidArguments("Incorrect number of arguments. Expecting 9, got 0".into())
        })?;
        if fields.len() < Medication::ARG_COUNT {
            return Err(Error::InvalidArguments(format!(
                "Incorrect number of arguments. Expecting {}, got {}",
                Medication::ARG_COUNT + 1,
                args.len()
            )));
        }
        let med = Medication::from_args(fields)?;

        let mut patient = self.load_patient(source_id)?;
        patient.meds.push(med);
        self.store_patient(source_id, &patient)?;

        tracing::info!(
            "Added medication to {} ({} on list)",
            source_id,
            patient.meds.len()
        );
        Ok(Vec::new())
    }

    /// `(sourceId, medName, fillDate)`: clear the first matching medication
    /// in place. The record is written back even when nothing matched; a
    /// patient that was never created is `NotFound` and nothing is written.
    pub fn remove_medication(&mut self, args: &[String]) -> Result<Vec<u8>> {
        let [source_id, med_name, fill_date, ..] = args else {
            return Err(Error::InvalidArguments(format!(
                "Incorrect number of arguments. Expecting 3, got {}",
                args.len()
            )));
        };

        let bytes = self
            .ledger
            .get(source_id)?
            .ok_or_else(|| Error::NotFound(source_id.clone()))?;
        let mut patient = Patient::decode(source_id, &bytes)?;
        match patient.clear_medication(med_name, fill_date) {
            Some(index) => tracing::info!(
                "Cleared medication {} ({}) at index {} for {}",
                med_name,
                fill_date,
                index,
                source_id
            ),
            None => tracing::info!(
                "No medication {} ({}) for {}",
                med_name,
                fill_date,
                source_id
            ),
        }
        self.store_patient(source_id, &patient)?;
        Ok(Vec::new())
    }

    /// `(startKey, endKey)`: every stored value in the inclusive range,
    /// joined as `[v1,v2,...]` without validation
    pub fn read_range(&self, args: &[String]) -> Result<Vec<u8>> {
        expect_exactly(args, 2, "Expecting start and end key")?;
        sanitize_arguments(args)?;

        let entries = self.ledger.range(&args[0], &args[1])?;
        tracing::debug!(
            "Range {}..={} matched {} records",
            args[0],
            args[1],
            entries.len()
        );

        let mut out = Vec::from(&b"["[..]);
        for (i, (_, value)) in entries.iter().enumerate() {
            if i > 0 {
                out.push(b',');
            }
            out.extend_from_slice(value);
        }
        out.push(b']');
        Ok(out)
    }

    /// Decode the patient at `key`; a key never written yields an empty patient
    fn load_patient(&self, key: &str) -> Result<Patient> {
        match self.ledger.get(key)? {
            Some(bytes) => Patient::decode(key, &bytes),
            None => {
                tracing::debug!("No record at {}, starting from an empty patient", key);
                Ok(Patient::default())
            }
        }
    }

    fn store_patient(&mut self, key: &str, patient: &Patient) -> Result<()> {
        let bytes = patient.encode()?;
        self.ledger.put(key, &bytes)
    }
}

fn expect_exactly(args: &[String], n: usize, hint: &str) -> Result<()> {
    if args.len() != n {
        return Err(Error::InvalidArguments(format!(
            "Incorrect number of arguments. {}",
            hint
        )));
    }
    Ok(())
}

/// Reject empty arguments to the generic key/value operations
fn sanitize_arguments(args: &[String]) -> Result<()> {
    match args.iter().position(|a| a.is_empty()) {
        Some(i) => Err(Error::InvalidArguments(format!(
            "Argument {} must be a non-empty string",
            i
        ))),
        None => Ok(()),
    }
}

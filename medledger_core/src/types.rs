//! Core domain types for the medledger record store.
//!
//! Records are stored as JSON with camelCase field names. Decoding is
//! lenient: absent fields take their empty value and `"meds": null` reads
//! as an empty list.

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Medication
// ============================================================================

/// A single dispensed medication owned by a patient record
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Medication {
    pub med_name: String,
    pub dosage: String,
    pub fill_date: String,
    pub form: String,
    pub quantity: String,
    pub count: String,
    pub fill_loc: String,
    pub prescriber: String,
}

impl Medication {
    /// Number of positional fields expected by [`Medication::from_args`]
    pub const ARG_COUNT: usize = 8;

    /// Build a medication from `(medName, count, dosage, fillDate, form,
    /// quantity, fillLoc, prescriber)`.
    ///
    /// Note the argument order differs from the field order.
    pub fn from_args(args: &[String]) -> Result<Self> {
        match args {
            [med_name, count, dosage, fill_date, form, quantity, fill_loc, prescriber, ..] => {
                Ok(Self {
                    med_name: med_name.clone(),
                    dosage: dosage.clone(),
                    fill_date: fill_date.clone(),
                    form: form.clone(),
                    quantity: quantity.clone(),
                    count: count.clone(),
                    fill_loc: fill_loc.clone(),
                    prescriber: prescriber.clone(),
                })
            }
            _ => Err(Error::InvalidArguments(format!(
                "Incorrect number of medication fields. Expecting {}, got {}",
                Self::ARG_COUNT,
                args.len()
            ))),
        }
    }

    /// True if this entry is identified by `(med_name, fill_date)`
    pub fn matches(&self, med_name: &str, fill_date: &str) -> bool {
        self.med_name == med_name && self.fill_date == fill_date
    }

    /// True for a cleared slot left behind by a removal
    pub fn is_tombstone(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// Patient
// ============================================================================

/// A patient record, stored in the ledger under its `source_id`
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Patient {
    pub source_id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub sex: String,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub meds: Vec<Medication>,
}

impl Patient {
    /// Number of positional fields expected by [`Patient::from_args`]
    pub const ARG_COUNT: usize = 6;

    /// Build a patient with no medications from `(sourceId, firstName,
    /// lastName, dateOfBirth, sex, phoneNumber)`. Extra fields are ignored.
    pub fn from_args(args: &[String]) -> Result<Self> {
        match args {
            [source_id, first_name, last_name, date_of_birth, sex, phone_number, ..] => {
                Ok(Self {
                    source_id: source_id.clone(),
                    first_name: first_name.clone(),
                    last_name: last_name.clone(),
                    date_of_birth: date_of_birth.clone(),
                    sex: sex.clone(),
                    phone_number: phone_number.clone(),
                    entity_id: None,
                    meds: Vec::new(),
                })
            }
            _ => Err(Error::InvalidArguments(format!(
                "Incorrect number of arguments. Expecting {}, got {}",
                Self::ARG_COUNT,
                args.len()
            ))),
        }
    }

    /// Decode a stored record
    pub fn decode(key: &str, bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|source| Error::Decode {
            key: key.to_string(),
            source,
        })
    }

    /// Encode this record in the canonical wire format
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|source| Error::Encoding {
            what: "Patient",
            source,
        })
    }

    /// Clear the first medication matching `(med_name, fill_date)` in place.
    ///
    /// Returns the index of the cleared slot. The list length never changes.
    pub fn clear_medication(&mut self, med_name: &str, fill_date: &str) -> Option<usize> {
        let index = self
            .meds
            .iter()
            .position(|m| m.matches(med_name, fill_date))?;
        self.meds[index] = Medication::default();
        Some(index)
    }

    /// Drop cleared slots, returning how many were removed
    pub fn compact_medications(&mut self) -> usize {
        let before = self.meds.len();
        self.meds.retain(|m| !m.is_tombstone());
        before - self.meds.len()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Medication>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Medication>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn aspirin() -> Medication {
        Medication::from_args(&args(&[
            "Aspirin", "1", "81mg", "2024-01-01", "tablet", "30", "PharmacyA", "DrX",
        ]))
        .unwrap()
    }

    #[test]
    fn test_medication_from_args_maps_positions() {
        let med = aspirin();
        assert_eq!(med.med_name, "Aspirin");
        assert_eq!(med.count, "1");
        assert_eq!(med.dosage, "81mg");
        assert_eq!(med.fill_date, "2024-01-01");
        assert_eq!(med.form, "tablet");
        assert_eq!(med.quantity, "30");
        assert_eq!(med.fill_loc, "PharmacyA");
        assert_eq!(med.prescriber, "DrX");
    }

    #[test]
    fn test_patient_from_args_too_few() {
        let result = Patient::from_args(&args(&["P1", "Ann", "Lee"]));
        assert!(matches!(result, Err(Error::InvalidArguments(_))));
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let mut patient =
            Patient::from_args(&args(&["P1", "Ann", "Lee", "1990-01-01", "F", "555-0100"]))
                .unwrap();
        patient.meds.push(aspirin());

        let json = String::from_utf8(patient.encode().unwrap()).unwrap();
        assert!(json.starts_with(r#"{"sourceId":"P1","firstName":"Ann""#));
        assert!(json.contains(r#""dateOfBirth":"1990-01-01""#));
        assert!(json.contains(r#""phoneNumber":"555-0100""#));
        assert!(json.contains(r#""medName":"Aspirin""#));
        assert!(json.contains(r#""fillLoc":"PharmacyA""#));
        assert!(!json.contains("entityId"));
    }

    #[test]
    fn test_decode_tolerates_null_meds_and_missing_fields() {
        let patient = Patient::decode("P9", br#"{"sourceId":"P9","meds":null}"#).unwrap();
        assert_eq!(patient.source_id, "P9");
        assert!(patient.first_name.is_empty());
        assert!(patient.meds.is_empty());
        assert_eq!(patient.entity_id, None);
    }

    #[test]
    fn test_decode_keeps_entity_id() {
        let patient =
            Patient::decode("P2", br#"{"sourceId":"P2","entityId":"E-7","meds":[]}"#).unwrap();
        assert_eq!(patient.entity_id.as_deref(), Some("E-7"));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let result = Patient::decode("P1", b"{ not json");
        assert!(matches!(result, Err(Error::Decode { .. })));
    }

    #[test]
    fn test_clear_medication_first_match_only() {
        let mut patient = Patient::default();
        patient.meds = vec![aspirin(), aspirin()];

        assert_eq!(patient.clear_medication("Aspirin", "2024-01-01"), Some(0));
        assert!(patient.meds[0].is_tombstone());
        assert_eq!(patient.meds[1], aspirin());
        assert_eq!(patient.meds.len(), 2);

        assert_eq!(patient.clear_medication("Aspirin", "1999-01-01"), None);
    }

    #[test]
    fn test_compact_medications_drops_tombstones() {
        let mut patient = Patient::default();
        patient.meds = vec![Medication::default(), aspirin(), Medication::default()];

        assert_eq!(patient.compact_medications(), 2);
        assert_eq!(patient.meds, vec![aspirin()]);
    }
}

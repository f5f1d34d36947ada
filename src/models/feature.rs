use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Closed enumeration for the `default`/`housing`/`loan` fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum YesNoUnknown {
    Yes,
    No,
    Unknown,
}

/// One customer/contact observation — the fixed model input schema.
///
/// Every field must be present and type-conformant; nothing is defaulted.
/// The `uknown_contact` spelling is part of the wire contract the trained
/// pipeline was fitted against and must not be corrected here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub age: i64,
    pub balance: f64,

    /// Day of month of the contact
    pub day: u32,

    /// Number of contacts performed during this campaign
    pub campaign: i64,

    pub job: String,
    pub education: String,

    #[serde(rename = "default")]
    pub default_status: YesNoUnknown,
    pub housing: YesNoUnknown,
    pub loan: YesNoUnknown,

    /// Binned category, e.g. "3-6_months" or "never_contacted"
    pub months_since_previous_contact: String,

    /// Binned category, e.g. "1-2"
    pub n_previous_contacts: String,

    /// Outcome of the previous campaign contact
    pub poutcome: String,

    pub had_contact: bool,
    pub is_single: bool,
    pub uknown_contact: bool,
}

impl FeatureRecord {
    /// The ordered list of required field names, as they appear on the wire.
    pub const FIELD_NAMES: [&'static str; 15] = [
        "age",
        "balance",
        "day",
        "campaign",
        "job",
        "education",
        "default",
        "housing",
        "loan",
        "months_since_previous_contact",
        "n_previous_contacts",
        "poutcome",
        "had_contact",
        "is_single",
        "uknown_contact",
    ];

    /// Return a copy of this record with the contact day replaced.
    ///
    /// The call-queue simulator scores the active call as if the contact were
    /// happening today, so the stored day of month is rebased onto the
    /// current one. A named step rather than an inline substitution so the
    /// business rule is testable on its own.
    pub fn with_contact_day(&self, day: u32) -> FeatureRecord {
        FeatureRecord {
            day,
            ..self.clone()
        }
    }
}

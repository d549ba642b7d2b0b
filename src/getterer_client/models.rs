use serde::{Deserialize as _, Deserializer};
use serde_derive::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

// ////////////// //
// Printer list   //
// ////////////// //

/// A printer as announced by `/printers?json=y`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PrinterRef {
    pub name: String,
    #[serde(rename = "desc", default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct PrinterList {
    printers: Vec<PrinterRef>,
}

pub fn decode_printer_list(body: &str) -> Result<Vec<PrinterRef>, DecodeError> {
    let list: PrinterList = serde_json::from_str(body).context(PrinterListSnafu)?;
    Ok(list.printers)
}

// ////// //
// Status //
// ////// //

/// The OctoPrint state of one printer, as relayed by `/status/{name}?json=y`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PrinterStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: PrinterState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PrinterState {
    #[serde(deserialize_with = "null_as_default")]
    pub error: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub flags: PrinterFlags,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrinterFlags {
    #[serde(deserialize_with = "null_as_default")]
    pub cancelling: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub closed_or_error: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub error: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub finishing: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub operational: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub paused: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub pausing: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub printing: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub ready: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub resuming: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub sd_ready: bool,
}

impl PrinterStatus {
    pub fn state_text(&self) -> &str {
        &self.state.text
    }

    pub fn error_text(&self) -> &str {
        &self.state.error
    }
}

// A `null` reads like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

pub fn decode_status(body: &str) -> Result<PrinterStatus, DecodeError> {
    serde_json::from_str(body).context(StatusSnafu)
}

// ////// //
// Errors //
// ////// //

#[derive(Debug, Snafu)]
pub enum DecodeError {
    #[snafu(display("Could not decode printer list"))]
    PrinterList { source: serde_json::Error },

    #[snafu(display("Could not decode printer status"))]
    Status { source: serde_json::Error },
}

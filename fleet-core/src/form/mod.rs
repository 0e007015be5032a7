//! Form state for the brand, model and vehicle editors.
//!
//! Edits arrive as typed intents ([`VehicleEdit`], [`ModelEdit`]) and are
//! applied as pure draft-to-draft transformations against a read-only
//! [`ReferenceData`](crate::ReferenceData) snapshot. [`EditSession`] tracks the
//! view → edit → save/cancel and delete-confirmation lifecycle, and
//! [`FormSession`] discards fetch results that arrive after the form they
//! were meant for has been reloaded or torn down.

mod edit_session;
mod model_form;
mod session;
mod validation;
mod vehicle_form;

use thiserror::Error;

pub use edit_session::{EditSession, FormAction, FormMode};
pub use model_form::{ModelEdit, ModelForm, validate_model};
pub use session::{FormSession, LoadOutcome, LoadState, LoadTicket};
pub use validation::{ValidationErrors, validate_brand_name};
pub use vehicle_form::{VehicleDraft, VehicleEdit, VehicleForm};

/// Errors raised by form operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
    /// The requested action is not allowed in the current mode.
    #[error("cannot {action} while {from}")]
    InvalidTransition { from: FormMode, action: FormAction },

    /// The draft failed validation.
    #[error("validation failed: {0}")]
    Invalid(ValidationErrors),
}

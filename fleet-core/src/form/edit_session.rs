use std::fmt;

use crate::form::FormError;

/// Where a form is in its view/edit/delete lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Viewing,
    Editing,
    ConfirmingDelete,
    Closed,
}

impl fmt::Display for FormMode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let s = match self {
            Self::Viewing => "viewing",
            Self::Editing => "editing",
            Self::ConfirmingDelete => "confirming delete",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Operations that move a form between modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    BeginEdit,
    Update,
    Cancel,
    Save,
    RequestDelete,
    DismissDelete,
    ConfirmDelete,
}

impl fmt::Display for FormAction {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let s = match self {
            Self::BeginEdit => "begin editing",
            Self::Update => "edit fields",
            Self::Cancel => "cancel",
            Self::Save => "save",
            Self::RequestDelete => "request delete",
            Self::DismissDelete => "dismiss delete",
            Self::ConfirmDelete => "confirm delete",
        };
        f.write_str(s)
    }
}

/// Saved record, working draft and lifecycle mode of one form.
///
/// An existing record opens in [`FormMode::Viewing`]; a new one opens in
/// [`FormMode::Editing`] with no saved copy. The draft only changes through
/// [`EditSession::update`] (while editing), [`EditSession::cancel`] and
/// [`EditSession::mark_saved`].
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession<T> {
    saved: Option<T>,
    draft: T,
    mode: FormMode,
}

impl<T: Clone> EditSession<T> {
    pub fn existing(record: T) -> Self {
        Self {
            saved: Some(record.clone()),
            draft: record,
            mode: FormMode::Viewing,
        }
    }

    pub fn new_record(blank: T) -> Self {
        Self {
            saved: None,
            draft: blank,
            mode: FormMode::Editing,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn draft(&self) -> &T {
        &self.draft
    }

    fn require(
        &self,
        expected: FormMode,
        action: FormAction,
    ) -> Result<(), FormError> {
        if self.mode == expected {
            Ok(())
        } else {
            Err(FormError::InvalidTransition {
                from: self.mode,
                action,
            })
        }
    }

    pub fn begin_edit(&mut self) -> Result<(), FormError> {
        self.require(FormMode::Viewing, FormAction::BeginEdit)?;
        self.mode = FormMode::Editing;
        Ok(())
    }

    /// Replaces the draft in a single step.
    pub fn update(
        &mut self,
        next: T,
    ) -> Result<(), FormError> {
        self.require(FormMode::Editing, FormAction::Update)?;
        self.draft = next;
        Ok(())
    }

    /// Abandons pending edits.
    ///
    /// An existing record goes back to viewing its saved state; a new record
    /// has nothing to go back to and the form closes.
    pub fn cancel(&mut self) -> Result<(), FormError> {
        self.require(FormMode::Editing, FormAction::Cancel)?;
        match &self.saved {
            Some(saved) => {
                self.draft = saved.clone();
                self.mode = FormMode::Viewing;
            }
            None => self.mode = FormMode::Closed,
        }
        Ok(())
    }

    /// Checks that the draft may be submitted and returns it.
    pub fn submission(&self) -> Result<&T, FormError> {
        self.require(FormMode::Editing, FormAction::Save)?;
        Ok(&self.draft)
    }

    /// Records a successful save; `record` is what the store now holds.
    pub fn mark_saved(
        &mut self,
        record: T,
    ) -> Result<(), FormError> {
        self.require(FormMode::Editing, FormAction::Save)?;
        self.saved = Some(record.clone());
        self.draft = record;
        self.mode = FormMode::Viewing;
        Ok(())
    }

    pub fn request_delete(&mut self) -> Result<(), FormError> {
        self.require(FormMode::Viewing, FormAction::RequestDelete)?;
        self.mode = FormMode::ConfirmingDelete;
        Ok(())
    }

    pub fn dismiss_delete(&mut self) -> Result<(), FormError> {
        self.require(FormMode::ConfirmingDelete, FormAction::DismissDelete)?;
        self.mode = FormMode::Viewing;
        Ok(())
    }

    pub fn confirm_delete(&mut self) -> Result<(), FormError> {
        self.require(FormMode::ConfirmingDelete, FormAction::ConfirmDelete)?;
        self.mode = FormMode::Closed;
        Ok(())
    }
}

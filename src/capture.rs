//! The two capture steps: picking an intake time, then a beverage.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, Timelike};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::catalog::{self, Brand, Category, DEFAULT_SIZE_LABEL, Drink, Size};
use crate::models::{AddCaffeinePayload, CaffeineEntry, Ticket};
use crate::utils::{format_api_datetime, format_time_label, local_datetime, truncate_to_minute};

/// Message shown when the backend rejects or never answers a submission
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to save. Try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    Hour,
    Minute,
}

/// Step 1: choose the intake time. The date stays fixed; only hour and
/// minute move, wrapping around.
#[derive(Debug, Clone)]
pub struct TimeStep {
    date: NaiveDate,
    hour: u32,
    minute: u32,
    pub field: TimeField,
}

impl TimeStep {
    /// Start from a previously chosen time, or from now
    pub fn new(initial: Option<DateTime<Local>>) -> Self {
        let start = truncate_to_minute(initial.unwrap_or_else(Local::now));
        Self {
            date: start.date_naive(),
            hour: start.hour(),
            minute: start.minute(),
            field: TimeField::Hour,
        }
    }

    pub fn time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }

    pub fn label(&self) -> String {
        format_time_label(self.time())
    }

    pub fn set_time(&mut self, time: NaiveTime) {
        self.hour = time.hour();
        self.minute = time.minute();
    }

    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            TimeField::Hour => TimeField::Minute,
            TimeField::Minute => TimeField::Hour,
        };
    }

    /// Step the focused field by `delta`, wrapping within its range
    pub fn adjust(&mut self, delta: i32) {
        match self.field {
            TimeField::Hour => self.hour = wrap(self.hour, delta, 24),
            TimeField::Minute => self.minute = wrap(self.minute, delta, 60),
        }
    }

    /// The chosen timestamp; always available since a default exists
    pub fn confirm(&self) -> DateTime<Local> {
        local_datetime(self.date, self.time())
    }
}

fn wrap(value: u32, delta: i32, modulus: u32) -> u32 {
    (value as i64 + delta as i64).rem_euclid(modulus as i64) as u32
}

/// In-progress beverage choice. Each variant carries only what its
/// category needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draft {
    Coffee {
        brand: Option<&'static Brand>,
        drink: Option<&'static Drink>,
        size: Option<&'static Size>,
    },
    Preset {
        category: Category,
        drink: Option<&'static Drink>,
    },
    Other {
        name: String,
        amount: String,
    },
}

impl Draft {
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Coffee => Draft::Coffee {
                brand: None,
                drink: None,
                size: None,
            },
            Category::Other => Draft::Other {
                name: String::new(),
                amount: String::new(),
            },
            category => Draft::Preset {
                category,
                drink: None,
            },
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Draft::Coffee { .. } => Category::Coffee,
            Draft::Preset { category, .. } => *category,
            Draft::Other { .. } => Category::Other,
        }
    }

    /// Every field the category requires is present
    pub fn is_complete(&self) -> bool {
        match self {
            Draft::Coffee { brand, drink, size } => {
                brand.is_some() && drink.is_some() && size.is_some()
            }
            Draft::Preset { drink, .. } => drink.is_some(),
            Draft::Other { name, amount } => {
                !name.trim().is_empty() && parse_amount(amount).is_some()
            }
        }
    }

    /// Build the request body and the display record. `None` while the
    /// draft is incomplete.
    pub fn artifacts(&self, intake_time: DateTime<Local>) -> Option<SaveArtifacts> {
        let date_time = format_api_datetime(&intake_time);
        let category_label = self.category().label().to_string();
        let (beverage, store_name, size, menu_name, mg) = match self {
            Draft::Coffee {
                brand: Some(brand),
                drink: Some(drink),
                size: Some(size),
            } => (
                format!("{} ({})", drink.name, size.label),
                brand.store_name.to_string(),
                size.label.to_string(),
                drink.name.to_string(),
                None,
            ),
            Draft::Coffee { .. } => return None,
            Draft::Preset {
                drink: Some(drink), ..
            } => (
                drink.name.to_string(),
                category_label.clone(),
                DEFAULT_SIZE_LABEL.to_string(),
                drink.name.to_string(),
                None,
            ),
            Draft::Preset { drink: None, .. } => return None,
            Draft::Other { name, amount } => {
                let name = name.trim();
                let mg = parse_amount(amount)?;
                if name.is_empty() {
                    return None;
                }
                (
                    name.to_string(),
                    category_label.clone(),
                    DEFAULT_SIZE_LABEL.to_string(),
                    name.to_string(),
                    Some(mg),
                )
            }
        };

        Some(SaveArtifacts {
            payload: AddCaffeinePayload {
                date_time,
                store_name: store_name.clone(),
                size: size.clone(),
                menu_name,
            },
            entry: CaffeineEntry {
                id: Uuid::new_v4(),
                beverage,
                category: category_label,
                time: intake_time,
                mg,
                store_name,
                size,
            },
        })
    }
}

/// Strictly positive integer milligrams
pub fn parse_amount(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|mg| *mg > 0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveArtifacts {
    pub payload: AddCaffeinePayload,
    pub entry: CaffeineEntry,
}

/// A submission handed to the network layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub ticket: Ticket,
    pub payload: AddCaffeinePayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Saved(CaffeineEntry),
    Failed,
    /// The result belongs to a submission this step no longer waits for
    Stale,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Choose a category first")]
    NoCategory,
    #[error("Not available for the {0} category")]
    WrongCategory(Category),
    #[error("Unknown brand: {0}")]
    UnknownBrand(String),
    #[error("Unknown drink: {0}")]
    UnknownDrink(String),
    #[error("Unknown size: {0}")]
    UnknownSize(String),
    #[error("Choose a brand first")]
    BrandRequired,
    #[error("Choose a drink first")]
    DrinkRequired,
    #[error("A submission is in progress")]
    Submitting,
}

#[derive(Debug, Clone)]
struct Pending {
    ticket: Ticket,
    entry: CaffeineEntry,
}

/// Step 2: choose the beverage and submit the combined record.
#[derive(Debug, Clone)]
pub struct BeverageStep {
    intake_time: DateTime<Local>,
    draft: Option<Draft>,
    pending: Option<Pending>,
    error: Option<String>,
}

impl BeverageStep {
    pub fn new(intake_time: DateTime<Local>) -> Self {
        Self {
            intake_time,
            draft: None,
            pending: None,
            error: None,
        }
    }

    pub fn intake_time(&self) -> DateTime<Local> {
        self.intake_time
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn category(&self) -> Option<Category> {
        self.draft.as_ref().map(Draft::category)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.pending.is_some()
    }

    /// Save is enabled only for a complete draft with nothing in flight
    pub fn can_save(&self) -> bool {
        !self.is_submitting() && self.draft.as_ref().is_some_and(Draft::is_complete)
    }

    fn ensure_idle(&self) -> Result<(), SelectionError> {
        if self.is_submitting() {
            Err(SelectionError::Submitting)
        } else {
            Ok(())
        }
    }

    /// Choosing a category always starts that category's draft afresh
    pub fn select_category(&mut self, category: Category) -> Result<(), SelectionError> {
        self.ensure_idle()?;
        self.draft = Some(Draft::for_category(category));
        Ok(())
    }

    /// Coffee only. Clears drink and size.
    pub fn select_brand(&mut self, brand_id: &str) -> Result<(), SelectionError> {
        self.ensure_idle()?;
        let chosen =
            catalog::brand(brand_id).ok_or_else(|| SelectionError::UnknownBrand(brand_id.to_string()))?;
        match self.draft.as_mut() {
            Some(Draft::Coffee { brand, drink, size }) => {
                *brand = Some(chosen);
                *drink = None;
                *size = None;
                Ok(())
            }
            Some(other) => Err(SelectionError::WrongCategory(other.category())),
            None => Err(SelectionError::NoCategory),
        }
    }

    /// Coffee (from the brand's menu, clears size) or a preset category.
    pub fn select_drink(&mut self, drink_id: &str) -> Result<(), SelectionError> {
        self.ensure_idle()?;
        match self.draft.as_mut() {
            Some(Draft::Coffee { brand, drink, size }) => {
                let brand = brand.ok_or(SelectionError::BrandRequired)?;
                let chosen = brand
                    .drink(drink_id)
                    .ok_or_else(|| SelectionError::UnknownDrink(drink_id.to_string()))?;
                *drink = Some(chosen);
                *size = None;
                Ok(())
            }
            Some(Draft::Preset { category, drink }) => {
                let chosen = catalog::find_drink(catalog::preset_drinks(*category), drink_id)
                    .ok_or_else(|| SelectionError::UnknownDrink(drink_id.to_string()))?;
                *drink = Some(chosen);
                Ok(())
            }
            Some(Draft::Other { .. }) => Err(SelectionError::WrongCategory(Category::Other)),
            None => Err(SelectionError::NoCategory),
        }
    }

    /// Coffee only; needs a drink and a size label the brand offers.
    pub fn select_size(&mut self, label: &str) -> Result<(), SelectionError> {
        self.ensure_idle()?;
        match self.draft.as_mut() {
            Some(Draft::Coffee { brand, drink, size }) => {
                let brand = brand.ok_or(SelectionError::BrandRequired)?;
                if drink.is_none() {
                    return Err(SelectionError::DrinkRequired);
                }
                let chosen = brand
                    .size_by_label(label)
                    .ok_or_else(|| SelectionError::UnknownSize(label.to_string()))?;
                *size = Some(chosen);
                Ok(())
            }
            Some(other) => Err(SelectionError::WrongCategory(other.category())),
            None => Err(SelectionError::NoCategory),
        }
    }

    pub fn set_custom_name(&mut self, value: &str) -> Result<(), SelectionError> {
        self.ensure_idle()?;
        match self.draft.as_mut() {
            Some(Draft::Other { name, .. }) => {
                *name = value.to_string();
                Ok(())
            }
            Some(other) => Err(SelectionError::WrongCategory(other.category())),
            None => Err(SelectionError::NoCategory),
        }
    }

    pub fn set_custom_amount(&mut self, value: &str) -> Result<(), SelectionError> {
        self.ensure_idle()?;
        match self.draft.as_mut() {
            Some(Draft::Other { amount, .. }) => {
                *amount = value.to_string();
                Ok(())
            }
            Some(other) => Err(SelectionError::WrongCategory(other.category())),
            None => Err(SelectionError::NoCategory),
        }
    }

    /// Start a submission. Returns `None` when save is disabled, which
    /// includes a submission already being in flight.
    pub fn begin_submit(&mut self) -> Option<Submission> {
        if !self.can_save() {
            return None;
        }
        let artifacts = self.draft.as_ref()?.artifacts(self.intake_time)?;
        let ticket = Ticket::next();
        info!(ticket = ticket.value(), menu = %artifacts.payload.menu_name, "caffeine submission started");
        self.error = None;
        self.pending = Some(Pending {
            ticket,
            entry: artifacts.entry,
        });
        Some(Submission {
            ticket,
            payload: artifacts.payload,
        })
    }

    /// Apply the network result for `ticket`. On failure the draft is kept
    /// for a manual retry.
    pub fn finish_submit<E: std::fmt::Display>(
        &mut self,
        ticket: Ticket,
        result: Result<(), E>,
    ) -> SubmitOutcome {
        let pending = match self.pending.take() {
            Some(pending) if pending.ticket == ticket => pending,
            other => {
                self.pending = other;
                return SubmitOutcome::Stale;
            }
        };
        match result {
            Ok(()) => SubmitOutcome::Saved(pending.entry),
            Err(e) => {
                error!(ticket = ticket.value(), error = %e, "caffeine submission failed");
                self.error = Some(SUBMIT_FAILED_MESSAGE.to_string());
                SubmitOutcome::Failed
            }
        }
    }

    /// Leave the step. Returns the ticket of an abandoned submission so
    /// the caller can abort it; its result will be treated as stale.
    pub fn cancel(&mut self) -> Option<Ticket> {
        self.pending.take().map(|pending| pending.ticket)
    }
}

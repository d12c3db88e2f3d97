//! Studio inventory: items, their stock health and the movement ledger.
//!
//! The ledger has no columns for movement notes or the resulting stock level,
//! so both are folded into the free-text reason ([`NewMovement::compose_reason`]).
//! Recording a movement with a `new_quantity` is two writes: the ledger row and
//! the item's current quantity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Enums ───────────────────────────────────────────────────────────────────

macro_rules! wire_enum {
  ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident),+ $(,)? }) => {
    $(#[$meta])*
    #[derive(
      Debug,
      Clone,
      Copy,
      PartialEq,
      Eq,
      Hash,
      PartialOrd,
      Ord,
      Serialize,
      Deserialize,
      strum::Display,
      strum::EnumString,
      strum::AsRefStr,
    )]
    #[serde(rename_all = "snake_case")]
    #[strum(serialize_all = "snake_case")]
    pub enum $name {
      $($(#[$vmeta])* $variant),+
    }
  };
}

wire_enum!(Category { Glaze, Clay, Engobe, Oxide, RawMaterial });

wire_enum!(
  #[derive(Default)]
  ItemStatus {
    #[default]
    Active,
    Archived,
  }
);

wire_enum!(
  /// `in` and `out` carry a quantity; `adjust` carries the new absolute level.
  MovementType { In, Out, Adjust }
);

wire_enum!(ColorFamily {
  Blancos,
  Negros,
  Azules,
  Verdes,
  Tierras,
  Transparentes,
  Efectos,
  Otros,
});

wire_enum!(GlazeFinish { Mate, Satinado, Brillo });

wire_enum!(FormulaUnit { Percent, Weight });

// ─── Stock health ────────────────────────────────────────────────────────────

wire_enum!(StockHealth { Ok, Low, Critical });

impl StockHealth {
  /// Classify a stock level against its minimum.
  ///
  /// No minimum (or a zero minimum) is always `ok`. At or below half the
  /// minimum, or at or below zero, is `critical`; at or below the minimum is
  /// `low`.
  pub fn classify(current: f64, min: Option<f64>) -> Self {
    let Some(min) = min.filter(|m| *m != 0.0) else {
      return Self::Ok;
    };
    if current <= 0.0 || current <= min * 0.5 {
      Self::Critical
    } else if current <= min {
      Self::Low
    } else {
      Self::Ok
    }
  }
}

// ─── Formula ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaComponent {
  pub name:       String,
  pub percentage: f64,
}

/// A glaze or engobe recipe: the base (A), additives (B) and colourants (C).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredFormula {
  #[serde(default)]
  pub recipe:    Vec<FormulaComponent>,
  #[serde(default)]
  pub additives: Vec<FormulaComponent>,
  #[serde(default)]
  pub colorants: Vec<FormulaComponent>,
}

impl StructuredFormula {
  fn components(&self) -> impl Iterator<Item = &FormulaComponent> {
    self.recipe.iter().chain(&self.additives).chain(&self.colorants)
  }

  /// Every component value must be a finite, non-negative number.
  pub fn validate(&self) -> Result<()> {
    match self
      .components()
      .find(|c| !c.percentage.is_finite() || c.percentage < 0.0)
    {
      Some(c) => Err(Error::InvalidQuantity(format!(
        "formula component {:?} has value {}",
        c.name, c.percentage
      ))),
      None => Ok(()),
    }
  }

  /// Sum of the base recipe, which should come to 100 in percent mode.
  pub fn recipe_total(&self) -> f64 { self.recipe.iter().map(|c| c.percentage).sum() }
}

// ─── Items ───────────────────────────────────────────────────────────────────

/// Category-specific attributes. Stored as one JSON document per item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDetails {
  // Glazes and engobes
  pub formula_unit:        Option<FormulaUnit>,
  pub formula:             Option<StructuredFormula>,
  pub firing_range:        Option<String>,
  pub surface:             Option<String>,
  pub color:               Option<String>,
  pub color_family:        Option<ColorFamily>,
  pub finish:              Option<GlazeFinish>,
  pub test_tile_reference: Option<String>,
  pub hazard_notes:        Option<String>,
  pub state:               Option<String>,
  pub engobe_base:         Option<String>,
  // Clays
  pub clay_type:           Option<String>,
  pub cone_or_temp:        Option<String>,
  pub body_notes:          Option<String>,
  pub unit_weight:         Option<f64>,
  // Oxides
  pub chemical_name:       Option<String>,
  pub purity:              Option<String>,
  // Raw materials
  pub material_type:       Option<String>,
}

impl ItemDetails {
  pub fn is_empty(&self) -> bool { self == &Self::default() }

  pub fn validate(&self) -> Result<()> {
    match &self.formula {
      Some(f) => f.validate(),
      None => Ok(()),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
  pub id:               Uuid,
  pub category:         Category,
  pub name:             String,
  pub code:             String,
  pub unit:             String,
  pub current_quantity: f64,
  pub min_quantity:     Option<f64>,
  pub location:         Option<String>,
  pub supplier:         Option<String>,
  pub supplier_code:    Option<String>,
  pub cost_per_unit:    Option<f64>,
  pub notes:            Option<String>,
  pub status:           ItemStatus,
  #[serde(flatten)]
  pub details:          ItemDetails,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

impl InventoryItem {
  pub fn health(&self) -> StockHealth {
    StockHealth::classify(self.current_quantity, self.min_quantity)
  }

  pub fn is_active(&self) -> bool { self.status == ItemStatus::Active }
}

/// Trimmed, upper-cased item code.
pub fn normalize_code(code: &str) -> String { code.trim().to_uppercase() }

fn check_code(code: &str, existing: &[InventoryItem], editing: Option<Uuid>) -> Result<String> {
  let code = normalize_code(code);
  if code.is_empty() {
    return Err(Error::MissingField("code"));
  }
  let taken = existing
    .iter()
    .filter(|i| Some(i.id) != editing)
    .any(|i| normalize_code(&i.code) == code);
  if taken {
    return Err(Error::DuplicateCode(code));
  }
  Ok(code)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
  pub category:         Category,
  pub name:             String,
  pub code:             String,
  pub unit:             String,
  #[serde(default)]
  pub current_quantity: f64,
  pub min_quantity:     Option<f64>,
  pub location:         Option<String>,
  pub supplier:         Option<String>,
  pub supplier_code:    Option<String>,
  pub cost_per_unit:    Option<f64>,
  pub notes:            Option<String>,
  #[serde(default)]
  pub status:           ItemStatus,
  #[serde(flatten)]
  pub details:          ItemDetails,
}

impl NewItem {
  pub fn new(category: Category, name: impl Into<String>, code: impl Into<String>) -> Self {
    Self {
      category,
      name: name.into(),
      code: code.into(),
      unit: String::new(),
      current_quantity: 0.0,
      min_quantity: None,
      location: None,
      supplier: None,
      supplier_code: None,
      cost_per_unit: None,
      notes: None,
      status: ItemStatus::Active,
      details: ItemDetails::default(),
    }
  }

  /// Apply the item form rules against the current item list: a name is
  /// required, the code is required and unique after normalisation, and any
  /// formula must be non-negative.
  pub fn validated(mut self, existing: &[InventoryItem]) -> Result<Self> {
    self.name = self.name.trim().to_string();
    if self.name.is_empty() {
      return Err(Error::MissingField("name"));
    }
    self.code = check_code(&self.code, existing, None)?;
    self.details.validate()?;
    Ok(self)
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemPatch {
  pub category:         Option<Category>,
  pub name:             Option<String>,
  pub code:             Option<String>,
  pub unit:             Option<String>,
  pub current_quantity: Option<f64>,
  pub min_quantity:     Option<f64>,
  pub location:         Option<String>,
  pub supplier:         Option<String>,
  pub supplier_code:    Option<String>,
  pub cost_per_unit:    Option<f64>,
  pub notes:            Option<String>,
  pub status:           Option<ItemStatus>,
  /// Replaces the whole details document when present.
  pub details:          Option<ItemDetails>,
}

impl ItemPatch {
  /// The patch that sets only the current quantity.
  pub fn quantity(q: f64) -> Self {
    Self {
      current_quantity: Some(q),
      ..Self::default()
    }
  }

  pub fn archive() -> Self {
    Self {
      status: Some(ItemStatus::Archived),
      ..Self::default()
    }
  }

  /// Same rules as [`NewItem::validated`], for the fields present.
  pub fn validated(mut self, existing: &[InventoryItem], id: Uuid) -> Result<Self> {
    if let Some(name) = &self.name {
      let name = name.trim().to_string();
      if name.is_empty() {
        return Err(Error::MissingField("name"));
      }
      self.name = Some(name);
    }
    if let Some(code) = &self.code {
      self.code = Some(check_code(code, existing, Some(id))?);
    }
    if let Some(details) = &self.details {
      details.validate()?;
    }
    Ok(self)
  }
}

// ─── Movements ───────────────────────────────────────────────────────────────

/// One row of the append-only ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryMovement {
  pub id:            Uuid,
  pub item_id:       Uuid,
  #[serde(rename = "type")]
  pub movement_type: MovementType,
  pub quantity:      Option<f64>,
  pub reason:        String,
  pub created_at:    DateTime<Utc>,
}

/// What the store appends to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
  pub item_id:       Uuid,
  pub movement_type: MovementType,
  pub quantity:      Option<f64>,
  pub reason:        String,
}

/// Input to [`crate::studio::Studio::record_movement`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMovement {
  pub item_id:       Uuid,
  #[serde(rename = "type")]
  pub movement_type: MovementType,
  pub quantity:      Option<f64>,
  /// Absolute stock level after the movement. Written to the item when set.
  pub new_quantity:  Option<f64>,
  pub reason:        String,
  pub notes:         Option<String>,
}

impl NewMovement {
  pub fn validate(&self) -> Result<()> {
    if self.reason.trim().is_empty() {
      return Err(Error::MissingField("reason"));
    }
    match self.movement_type {
      MovementType::Adjust => match self.new_quantity {
        Some(q) if q.is_finite() => Ok(()),
        Some(q) => Err(Error::InvalidQuantity(format!("adjusted quantity {q}"))),
        None => Err(Error::MissingField("new_quantity")),
      },
      MovementType::In | MovementType::Out => match self.quantity {
        Some(q) if q > 0.0 && q.is_finite() => Ok(()),
        Some(q) => Err(Error::InvalidQuantity(format!("quantity must be greater than 0, got {q}"))),
        None => Err(Error::MissingField("quantity")),
      },
    }
  }

  /// `reason (Nota: notes) [Stock: n]`, skipping the parts that are absent.
  pub fn compose_reason(&self) -> String {
    let notes = self
      .notes
      .as_deref()
      .map(str::trim)
      .filter(|n| !n.is_empty())
      .map(|n| format!("(Nota: {n})"));
    let stock = self.new_quantity.map(|q| format!("[Stock: {q}]"));

    [Some(self.reason.trim().to_string()), notes, stock]
      .into_iter()
      .flatten()
      .filter(|s| !s.is_empty())
      .collect::<Vec<_>>()
      .join(" ")
  }

  pub fn ledger_entry(&self) -> LedgerEntry {
    LedgerEntry {
      item_id:       self.item_id,
      movement_type: self.movement_type,
      quantity:      self.quantity,
      reason:        self.compose_reason(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn movement(movement_type: MovementType) -> NewMovement {
    NewMovement {
      item_id: Uuid::new_v4(),
      movement_type,
      quantity: None,
      new_quantity: None,
      reason: "Compra".into(),
      notes: None,
    }
  }

  #[test]
  fn health_thresholds() {
    assert_eq!(StockHealth::classify(0.5, None), StockHealth::Ok);
    assert_eq!(StockHealth::classify(-1.0, Some(0.0)), StockHealth::Ok);
    assert_eq!(StockHealth::classify(0.0, Some(2.0)), StockHealth::Critical);
    assert_eq!(StockHealth::classify(1.0, Some(2.0)), StockHealth::Critical);
    assert_eq!(StockHealth::classify(1.5, Some(2.0)), StockHealth::Low);
    assert_eq!(StockHealth::classify(2.0, Some(2.0)), StockHealth::Low);
    assert_eq!(StockHealth::classify(4.5, Some(2.0)), StockHealth::Ok);
  }

  #[test]
  fn reason_composition() {
    let mut m = movement(MovementType::Adjust);
    m.new_quantity = Some(3.5);
    m.notes = Some("recuento mensual".into());
    assert_eq!(m.compose_reason(), "Compra (Nota: recuento mensual) [Stock: 3.5]");

    let mut m = movement(MovementType::In);
    m.quantity = Some(2.0);
    assert_eq!(m.compose_reason(), "Compra");

    let mut m = movement(MovementType::Adjust);
    m.new_quantity = Some(10.0);
    assert_eq!(m.compose_reason(), "Compra [Stock: 10]");
  }

  #[test]
  fn movement_validation() {
    let mut m = movement(MovementType::Out);
    m.quantity = Some(0.0);
    assert!(matches!(m.validate(), Err(Error::InvalidQuantity(_))));
    m.quantity = Some(1.0);
    assert!(m.validate().is_ok());

    let mut m = movement(MovementType::Adjust);
    assert!(matches!(m.validate(), Err(Error::MissingField("new_quantity"))));
    m.new_quantity = Some(0.0);
    assert!(m.validate().is_ok());
    m.reason = "  ".into();
    assert!(matches!(m.validate(), Err(Error::MissingField("reason"))));
  }

  #[test]
  fn codes_are_normalised_and_unique() {
    let now = Utc::now();
    let existing = InventoryItem {
      id:               Uuid::new_v4(),
      category:         Category::Glaze,
      name:             "Blanco Nieve Brillo".into(),
      code:             "GL-001".into(),
      unit:             "l".into(),
      current_quantity: 4.5,
      min_quantity:     Some(2.0),
      location:         None,
      supplier:         None,
      supplier_code:    None,
      cost_per_unit:    None,
      notes:            None,
      status:           ItemStatus::Active,
      details:          ItemDetails::default(),
      created_at:       now,
      updated_at:       now,
    };

    let dup = NewItem::new(Category::Glaze, "Otro", " gl-001 ");
    assert!(matches!(
      dup.validated(std::slice::from_ref(&existing)),
      Err(Error::DuplicateCode(c)) if c == "GL-001"
    ));

    let fresh = NewItem::new(Category::Glaze, "Celadón", " gl-002 ")
      .validated(std::slice::from_ref(&existing))
      .unwrap();
    assert_eq!(fresh.code, "GL-002");

    // Re-saving an item with its own code is fine.
    let patch = ItemPatch {
      code: Some("gl-001".into()),
      ..ItemPatch::default()
    };
    assert!(patch.validated(std::slice::from_ref(&existing), existing.id).is_ok());
  }

  #[test]
  fn negative_formula_rejected() {
    let mut item = NewItem::new(Category::Glaze, "Tenmoku", "GL-003");
    item.details.formula = Some(StructuredFormula {
      recipe: vec![FormulaComponent {
        name:       "Feldespato".into(),
        percentage: -5.0,
      }],
      ..StructuredFormula::default()
    });
    assert!(matches!(item.validated(&[]), Err(Error::InvalidQuantity(_))));
  }
}

//! Side-by-side comparison of two vehicle records

use crate::data::{FieldValue, VehicleRecord, Vin};

/// Two looked-up vehicles
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub first_vin: Vin,
    pub first: VehicleRecord,
    pub second_vin: Vin,
    pub second: VehicleRecord,
}

/// One field across both vehicles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonRow<'a> {
    pub field: &'a str,
    pub first: Option<&'a FieldValue>,
    pub second: Option<&'a FieldValue>,
}

impl ComparisonRow<'_> {
    /// True when the two vehicles disagree, including a field only one has
    pub fn differs(&self) -> bool {
        self.first != self.second
    }
}

impl Comparison {
    pub fn new(first_vin: Vin, first: VehicleRecord, second_vin: Vin, second: VehicleRecord) -> Self {
        Self {
            first_vin,
            first,
            second_vin,
            second,
        }
    }

    /// Every field name from either record
    ///
    /// Fields come in the first record's order, followed by fields only the
    /// second record has, in its order.
    pub fn rows(&self) -> Vec<ComparisonRow<'_>> {
        let mut rows: Vec<ComparisonRow<'_>> = self
            .first
            .iter()
            .map(|(field, value)| ComparisonRow {
                field,
                first: Some(value),
                second: self.second.get(field),
            })
            .collect();

        rows.extend(
            self.second
                .iter()
                .filter(|(field, _)| self.first.get(field).is_none())
                .map(|(field, value)| ComparisonRow {
                    field,
                    first: None,
                    second: Some(value),
                }),
        );

        rows
    }

    /// Number of fields that differ
    pub fn differing(&self) -> usize {
        self.rows().iter().filter(|row| row.differs()).count()
    }
}

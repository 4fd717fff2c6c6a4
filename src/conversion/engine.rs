//! Unit conversion engine
//!
//! Converts a quantity of a product between units by going through kilograms:
//! source unit -> kg -> target unit. Weight units carry a fixed factor; piece
//! and pallet weights come from the product's packaging configuration.
//!
//! Rounding:
//! - to piece: `Ceil` rounds up, `Strict` rejects fractional counts
//! - to pallet: always rounded up, whatever the piece rounding mode
//! - to weight units: exact

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::models::{Product, Unit};

use super::error::{ConversionError, ConversionResult};
use super::lookup::PackagingLookup;
use super::units::{PieceRounding, UnitName};

/// Optional inputs to a conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Required when either side of the conversion is a pallet
    pub warehouse_id: Option<i64>,
    pub piece_rounding: PieceRounding,
}

/// Converts product quantities using a packaging lookup
pub struct UnitConverter<'a, L: PackagingLookup + ?Sized> {
    lookup: &'a L,
}

impl<'a, L: PackagingLookup + ?Sized> UnitConverter<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self { lookup }
    }

    /// Convert a floating point quantity; arithmetic is done in decimal
    pub fn convert(
        &self,
        product: &Product,
        quantity: f64,
        from: &Unit,
        to: &Unit,
        options: ConvertOptions,
    ) -> ConversionResult<f64> {
        let quantity = decimal_from_f64(quantity)?;
        let result = self.convert_decimal(product, quantity, from, to, options)?;
        result
            .to_f64()
            .ok_or(ConversionError::ArithmeticOverflow { unit: to.name })
    }

    /// Convert a decimal quantity exactly
    pub fn convert_decimal(
        &self,
        product: &Product,
        quantity: Decimal,
        from: &Unit,
        to: &Unit,
        options: ConvertOptions,
    ) -> ConversionResult<Decimal> {
        let kg = self.to_kg(product, quantity, from, options.warehouse_id)?;
        let result = self.from_kg(product, kg, to, options)?.normalize();

        tracing::debug!(
            product_id = product.id,
            from = %from.name,
            to = %to.name,
            quantity = %quantity,
            kg = %kg,
            result = %result,
            "Converted quantity"
        );

        Ok(result)
    }

    fn to_kg(
        &self,
        product: &Product,
        quantity: Decimal,
        unit: &Unit,
        warehouse_id: Option<i64>,
    ) -> ConversionResult<Decimal> {
        let kg_per_unit = match unit.name {
            UnitName::Piece => self.piece_kg(product, unit.name)?,
            UnitName::Pallet => self.pallet_kg(product, unit.name, warehouse_id)?,
            _ if unit.is_weight_based => Decimal::from(unit.to_kg_factor),
            _ => return Err(ConversionError::UnsupportedUnitKind { unit: unit.name }),
        };

        quantity
            .checked_mul(kg_per_unit)
            .ok_or(ConversionError::ArithmeticOverflow { unit: unit.name })
    }

    fn from_kg(
        &self,
        product: &Product,
        kg: Decimal,
        unit: &Unit,
        options: ConvertOptions,
    ) -> ConversionResult<Decimal> {
        match unit.name {
            UnitName::Piece => {
                let per_piece = self.piece_kg(product, unit.name)?;
                let (whole, remainder) = whole_units(kg, per_piece, unit.name)?;
                match options.piece_rounding {
                    PieceRounding::Ceil => round_up(whole, remainder, unit.name),
                    PieceRounding::Strict if remainder.is_zero() => Ok(whole),
                    PieceRounding::Strict => {
                        let value = kg
                            .checked_div(per_piece)
                            .map(|pieces| pieces.normalize().to_string())
                            .unwrap_or_else(|| format!("{} kg / {} kg", kg, per_piece));
                        tracing::warn!(
                            product_id = product.id,
                            pieces = %value,
                            "Strict piece conversion is not a whole number"
                        );
                        Err(ConversionError::NonIntegerPieceResult {
                            unit: unit.name,
                            value,
                        })
                    }
                }
            }
            UnitName::Pallet => {
                let per_pallet = self.pallet_kg(product, unit.name, options.warehouse_id)?;
                // A partly filled pallet still takes a whole pallet
                let (whole, remainder) = whole_units(kg, per_pallet, unit.name)?;
                round_up(whole, remainder, unit.name)
            }
            _ if unit.is_weight_based => divide(kg, Decimal::from(unit.to_kg_factor), unit.name),
            _ => Err(ConversionError::UnsupportedUnitKind { unit: unit.name }),
        }
    }

    fn require_piece_based(&self, product: &Product, unit: UnitName) -> ConversionResult<()> {
        if product.is_piece_based {
            Ok(())
        } else {
            Err(ConversionError::UnsupportedUnitForProduct {
                unit,
                product: product.identity(),
            })
        }
    }

    /// Kilograms in one piece
    fn piece_kg(&self, product: &Product, unit: UnitName) -> ConversionResult<Decimal> {
        self.require_piece_based(product, unit)?;
        let kg = self
            .lookup
            .piece_weight_kg(product.id)?
            .ok_or_else(|| ConversionError::MissingPieceConfiguration {
                product: product.identity(),
            })?;
        if kg <= Decimal::ZERO {
            return Err(ConversionError::InvalidPackagingConfiguration {
                product: product.identity(),
                reason: format!("piece weight must be positive, got {} kg", kg),
            });
        }
        Ok(kg)
    }

    /// Kilograms on one pallet at the warehouse
    fn pallet_kg(
        &self,
        product: &Product,
        unit: UnitName,
        warehouse_id: Option<i64>,
    ) -> ConversionResult<Decimal> {
        self.require_piece_based(product, unit)?;
        let warehouse_id = warehouse_id.ok_or(ConversionError::WarehouseRequired { unit })?;
        let items = self
            .lookup
            .items_per_pallet(product.id, warehouse_id)?
            .ok_or_else(|| ConversionError::MissingPalletConfiguration {
                product: product.identity(),
                warehouse_id,
            })?;
        if items == 0 {
            return Err(ConversionError::InvalidPackagingConfiguration {
                product: product.identity(),
                reason: format!("items per pallet at warehouse {} must be positive", warehouse_id),
            });
        }
        let per_piece = self.piece_kg(product, unit)?;

        Decimal::from(items)
            .checked_mul(per_piece)
            .ok_or(ConversionError::ArithmeticOverflow { unit })
    }
}

fn divide(kg: Decimal, kg_per_unit: Decimal, unit: UnitName) -> ConversionResult<Decimal> {
    kg.checked_div(kg_per_unit)
        .ok_or(ConversionError::ArithmeticOverflow { unit })
}

/// Whole units in `kg`, truncated toward zero, and the exact kilograms left over.
///
/// The quotient of `checked_div` is rounded to 28 significant digits, so it
/// cannot tell 1.00000000000000000000000000005 from 1. The remainder is exact.
fn whole_units(kg: Decimal, kg_per_unit: Decimal, unit: UnitName) -> ConversionResult<(Decimal, Decimal)> {
    let remainder = kg
        .checked_rem(kg_per_unit)
        .ok_or(ConversionError::ArithmeticOverflow { unit })?;
    let whole = kg
        .checked_sub(remainder)
        .ok_or(ConversionError::ArithmeticOverflow { unit })
        .and_then(|exact| divide(exact, kg_per_unit, unit))?
        .trunc();
    Ok((whole, remainder))
}

/// Round a truncated count toward +inf; a negative remainder is already rounded up
fn round_up(whole: Decimal, remainder: Decimal, unit: UnitName) -> ConversionResult<Decimal> {
    if remainder > Decimal::ZERO {
        whole
            .checked_add(Decimal::ONE)
            .ok_or(ConversionError::ArithmeticOverflow { unit })
    } else {
        Ok(whole)
    }
}

/// Decimal value of a float, taken from its shortest text form so 0.1 stays 0.1
pub fn decimal_from_f64(quantity: f64) -> ConversionResult<Decimal> {
    if !quantity.is_finite() {
        return Err(ConversionError::InvalidQuantity(format!(
            "{} is not a finite number",
            quantity
        )));
    }
    Decimal::from_str(&quantity.to_string())
        .map_err(|e| ConversionError::InvalidQuantity(format!("{}: {}", quantity, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::StaticPackaging;

    const BAG: i64 = 1;
    const LOOSE: i64 = 2;
    const UNCONFIGURED: i64 = 3;
    const WAREHOUSE: i64 = 10;
    const OTHER_WAREHOUSE: i64 = 11;

    fn product(id: i64, is_piece_based: bool) -> Product {
        Product {
            id,
            name: format!("product-{}", id),
            title: String::new(),
            for_web: false,
            is_piece_based,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn unit(name: UnitName) -> Unit {
        Unit::canonical(name)
    }

    /// 20 kg bags, 40 bags per pallet at WAREHOUSE (800 kg per pallet)
    fn packaging() -> StaticPackaging {
        StaticPackaging::new()
            .with_piece_weight(BAG, Decimal::from(20))
            .with_pallet(BAG, WAREHOUSE, 40)
            .with_pallet(UNCONFIGURED, WAREHOUSE, 40)
    }

    fn convert(
        product_id: i64,
        quantity: f64,
        from: UnitName,
        to: UnitName,
        options: ConvertOptions,
    ) -> ConversionResult<f64> {
        let lookup = packaging();
        let piece_based = product_id != LOOSE;
        UnitConverter::new(&lookup).convert(
            &product(product_id, piece_based),
            quantity,
            &unit(from),
            &unit(to),
            options,
        )
    }

    fn strict() -> ConvertOptions {
        ConvertOptions {
            piece_rounding: PieceRounding::Strict,
            ..Default::default()
        }
    }

    fn at_warehouse(piece_rounding: PieceRounding) -> ConvertOptions {
        ConvertOptions {
            warehouse_id: Some(WAREHOUSE),
            piece_rounding,
        }
    }

    #[test]
    fn test_ton_to_kilogram_and_back() {
        let opts = ConvertOptions::default();
        assert_eq!(convert(BAG, 2.5, UnitName::Ton, UnitName::Kilogram, opts).unwrap(), 2500.0);
        assert_eq!(convert(BAG, 2500.0, UnitName::Kilogram, UnitName::Ton, opts).unwrap(), 2.5);
    }

    #[test]
    fn test_weight_conversions_are_lossless() {
        let lookup = packaging();
        let converter = UnitConverter::new(&lookup);
        let p = product(LOOSE, false);
        let (kg, ton) = (unit(UnitName::Kilogram), unit(UnitName::Ton));

        for q in ["0.1", "1", "2.5", "1234.5678", "0.001"] {
            let q = Decimal::from_str(q).unwrap();
            let tons = converter.convert_decimal(&p, q, &kg, &ton, ConvertOptions::default()).unwrap();
            let back = converter.convert_decimal(&p, tons, &ton, &kg, ConvertOptions::default()).unwrap();
            assert_eq!(back, q);
        }
    }

    #[test]
    fn test_decimal_avoids_float_drift() {
        let opts = ConvertOptions::default();
        assert_eq!(convert(LOOSE, 0.1, UnitName::Ton, UnitName::Kilogram, opts).unwrap(), 100.0);
        assert_eq!(convert(LOOSE, 0.3, UnitName::Kilogram, UnitName::Kilogram, opts).unwrap(), 0.3);
    }

    #[test]
    fn test_piece_to_kilogram() {
        let result = convert(BAG, 3.0, UnitName::Piece, UnitName::Kilogram, ConvertOptions::default());
        assert_eq!(result.unwrap(), 60.0);
    }

    #[test]
    fn test_ceil_piece_rounding() {
        let result = convert(BAG, 25.0, UnitName::Kilogram, UnitName::Piece, ConvertOptions::default());
        assert_eq!(result.unwrap(), 2.0);
    }

    #[test]
    fn test_strict_piece_rounding() {
        match convert(BAG, 25.0, UnitName::Kilogram, UnitName::Piece, strict()) {
            Err(ConversionError::NonIntegerPieceResult { unit, value }) => {
                assert_eq!(unit, UnitName::Piece);
                assert_eq!(value, "1.25");
            }
            other => panic!("expected NonIntegerPieceResult, got {:?}", other),
        }

        assert_eq!(convert(BAG, 40.0, UnitName::Kilogram, UnitName::Piece, strict()).unwrap(), 2.0);
    }

    #[test]
    fn test_piece_round_trip_rounds_up() {
        for q in [1.0, 3.4, 0.2, 7.999] {
            let kg = convert(BAG, q, UnitName::Piece, UnitName::Kilogram, ConvertOptions::default()).unwrap();
            let back = convert(BAG, kg, UnitName::Kilogram, UnitName::Piece, ConvertOptions::default()).unwrap();
            assert_eq!(back, q.ceil());
        }
    }

    #[test]
    fn test_pallet_always_rounds_up() {
        // 1000 kg over 800 kg pallets
        for rounding in [PieceRounding::Ceil, PieceRounding::Strict] {
            let result = convert(BAG, 1000.0, UnitName::Kilogram, UnitName::Pallet, at_warehouse(rounding));
            assert_eq!(result.unwrap(), 2.0);
        }
        let exact = convert(BAG, 1600.0, UnitName::Kilogram, UnitName::Pallet, at_warehouse(PieceRounding::Strict));
        assert_eq!(exact.unwrap(), 2.0);
    }

    #[test]
    fn test_counts_beyond_division_precision() {
        let lookup = packaging();
        let converter = UnitConverter::new(&lookup);
        let p = product(BAG, true);
        let (kg, piece) = (unit(UnitName::Kilogram), unit(UnitName::Piece));
        // 1.00000000000000000000000000005 pieces; the rounded quotient reads 1
        let q = Decimal::from_str("20.000000000000000000000000001").unwrap();

        let err = converter.convert_decimal(&p, q, &kg, &piece, strict()).unwrap_err();
        assert_eq!(err.kind(), "non_integer_piece_result");

        let pieces = converter.convert_decimal(&p, q, &kg, &piece, ConvertOptions::default()).unwrap();
        assert_eq!(pieces, Decimal::from(2));
    }

    #[test]
    fn test_tiny_positive_quantity_needs_one_unit() {
        let to_piece = convert(BAG, 1e-27, UnitName::Kilogram, UnitName::Piece, ConvertOptions::default());
        assert_eq!(to_piece.unwrap(), 1.0);

        let to_pallet = convert(BAG, 1e-25, UnitName::Kilogram, UnitName::Pallet, at_warehouse(PieceRounding::Strict));
        assert_eq!(to_pallet.unwrap(), 1.0);

        let strict = convert(BAG, 1e-27, UnitName::Kilogram, UnitName::Piece, strict());
        assert_eq!(strict.unwrap_err().kind(), "non_integer_piece_result");
    }

    #[test]
    fn test_negative_quantity_rounds_toward_positive() {
        let result = convert(BAG, -25.0, UnitName::Kilogram, UnitName::Piece, ConvertOptions::default());
        assert_eq!(result.unwrap(), -1.0);
        assert_eq!(convert(BAG, 0.0, UnitName::Kilogram, UnitName::Piece, strict()).unwrap(), 0.0);
    }

    #[test]
    fn test_non_positive_packaging_is_rejected() {
        let lookup = StaticPackaging::new()
            .with_piece_weight(BAG, Decimal::ZERO)
            .with_piece_weight(LOOSE, Decimal::from(-20))
            .with_piece_weight(UNCONFIGURED, Decimal::from(20))
            .with_pallet(UNCONFIGURED, WAREHOUSE, 0);
        let converter = UnitConverter::new(&lookup);
        let (kg, piece, pallet) = (unit(UnitName::Kilogram), unit(UnitName::Piece), unit(UnitName::Pallet));
        let q = Decimal::from(40);

        for id in [BAG, LOOSE] {
            let err = converter
                .convert_decimal(&product(id, true), q, &kg, &piece, ConvertOptions::default())
                .unwrap_err();
            assert_eq!(err.kind(), "invalid_packaging_configuration");
        }

        let err = converter
            .convert_decimal(&product(UNCONFIGURED, true), q, &kg, &pallet, at_warehouse(PieceRounding::Ceil))
            .unwrap_err();
        assert!(matches!(err, ConversionError::InvalidPackagingConfiguration { .. }));
    }

    #[test]
    fn test_pallet_to_piece_and_ton() {
        let opts = at_warehouse(PieceRounding::Strict);
        assert_eq!(convert(BAG, 2.0, UnitName::Pallet, UnitName::Piece, opts).unwrap(), 80.0);
        assert_eq!(convert(BAG, 2.0, UnitName::Pallet, UnitName::Ton, opts).unwrap(), 1.6);
        assert_eq!(convert(BAG, 1.5, UnitName::Ton, UnitName::Pallet, opts).unwrap(), 2.0);
    }

    #[test]
    fn test_weight_only_product_rejects_piece_and_pallet() {
        for to in [UnitName::Piece, UnitName::Pallet] {
            match convert(LOOSE, 10.0, UnitName::Kilogram, to, at_warehouse(PieceRounding::Ceil)) {
                Err(ConversionError::UnsupportedUnitForProduct { unit, .. }) => assert_eq!(unit, to),
                other => panic!("expected UnsupportedUnitForProduct, got {:?}", other),
            }
        }
        let err = convert(LOOSE, 1.0, UnitName::Piece, UnitName::Kilogram, ConvertOptions::default()).unwrap_err();
        assert_eq!(err.kind(), "unsupported_unit_for_product");
    }

    #[test]
    fn test_missing_pallet_configuration() {
        let missing = ConvertOptions {
            warehouse_id: Some(OTHER_WAREHOUSE),
            ..Default::default()
        };
        match convert(BAG, 10.0, UnitName::Kilogram, UnitName::Pallet, missing) {
            Err(ConversionError::MissingPalletConfiguration { warehouse_id, .. }) => {
                assert_eq!(warehouse_id, OTHER_WAREHOUSE)
            }
            other => panic!("expected MissingPalletConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn test_warehouse_required_on_either_side() {
        let opts = ConvertOptions::default();
        let to = convert(BAG, 10.0, UnitName::Kilogram, UnitName::Pallet, opts).unwrap_err();
        assert!(matches!(to, ConversionError::WarehouseRequired { unit: UnitName::Pallet }));

        let from = convert(BAG, 1.0, UnitName::Pallet, UnitName::Kilogram, opts).unwrap_err();
        assert_eq!(from.kind(), "warehouse_required");
    }

    #[test]
    fn test_missing_piece_configuration() {
        let err = convert(UNCONFIGURED, 10.0, UnitName::Kilogram, UnitName::Piece, ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, ConversionError::MissingPieceConfiguration { .. }));

        // The pallet row exists but the piece weight it depends on does not
        let err = convert(UNCONFIGURED, 10.0, UnitName::Kilogram, UnitName::Pallet, at_warehouse(PieceRounding::Ceil)).unwrap_err();
        assert!(matches!(err, ConversionError::MissingPieceConfiguration { .. }));
    }

    #[test]
    fn test_unsupported_unit_kind() {
        let opts = ConvertOptions::default();
        let err = convert(BAG, 10.0, UnitName::Percent, UnitName::Kilogram, opts).unwrap_err();
        assert!(matches!(err, ConversionError::UnsupportedUnitKind { unit: UnitName::Percent }));

        let err = convert(BAG, 10.0, UnitName::Kilogram, UnitName::Litre, opts).unwrap_err();
        assert_eq!(err.unit(), Some(UnitName::Litre));
        assert_eq!(err.kind(), "unsupported_unit_kind");
    }

    #[test]
    fn test_invalid_quantity() {
        let opts = ConvertOptions::default();
        for q in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = convert(BAG, q, UnitName::Kilogram, UnitName::Ton, opts).unwrap_err();
            assert_eq!(err.kind(), "invalid_quantity");
        }
    }

    #[test]
    fn test_decimal_from_f64() {
        assert_eq!(decimal_from_f64(0.1).unwrap(), Decimal::new(1, 1));
        assert_eq!(decimal_from_f64(25.0).unwrap(), Decimal::from(25));
        assert_eq!(decimal_from_f64(-2.5).unwrap(), Decimal::new(-25, 1));
    }

    #[test]
    fn test_sqlite_lookup_matches_static_lookup() {
        use crate::config::PieceWeightPolicy;
        use crate::db::test_conn;
        use crate::models::{
            ProductCreate, ProductPallet, ProductPalletSet, ProductPiece, Warehouse, WarehouseCreate,
        };

        let conn = test_conn();
        let p = Product::create(
            &conn,
            &ProductCreate { name: "Cement".into(), title: String::new(), for_web: false, is_piece_based: true },
        )
        .unwrap();
        let w = Warehouse::create(
            &conn,
            &WarehouseCreate { name: "North".into(), organization: None, address: None, phone_number: None },
        )
        .unwrap();
        ProductPiece::set(&conn, p.id, Decimal::from(20), &PieceWeightPolicy::default()).unwrap();
        ProductPallet::set(&conn, &ProductPalletSet { product_id: p.id, warehouse_id: w.id, items_per_pallet: 40 }).unwrap();

        let kg = Unit::get_by_name(&conn, UnitName::Kilogram).unwrap().unwrap();
        let pallet = Unit::get_by_name(&conn, UnitName::Pallet).unwrap().unwrap();
        let options = ConvertOptions { warehouse_id: Some(w.id), piece_rounding: PieceRounding::Strict };

        let converter = UnitConverter::new(&conn);
        assert_eq!(converter.convert(&p, 1000.0, &kg, &pallet, options).unwrap(), 2.0);
        assert_eq!(converter.convert(&p, 2.0, &pallet, &kg, options).unwrap(), 1600.0);
    }
}

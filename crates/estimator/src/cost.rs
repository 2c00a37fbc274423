//! Print cost and time estimation.
//!
//! Two independent estimate paths exist: the instant volumetric path here,
//! and the slicer-output path in [`crate::slicer_output`]. They share only
//! [`quote`] and are expected to disagree numerically.

use shared::{Estimate, EstimateRequest, PrintSpeedModel};

use crate::error::{GeometryError, GeometryResult};

/// Filament price used when a material has none configured.
pub const DEFAULT_PRICE_PER_KG: f64 = 25.0;

/// Cost of filament mass and machine time.
pub trait PriceModel {
    /// Cost of `grams` of filament.
    fn filament_cost(&self, grams: f64) -> f64;
    /// Cost of `hours` of printing.
    fn time_cost(&self, hours: f64) -> f64;
    /// Flat add-on per print.
    fn flat_cost(&self) -> f64 {
        0.0
    }
}

/// Price a job. Shared by both estimate paths.
pub fn quote<P: PriceModel + ?Sized>(pricing: &P, filament_grams: f64, time_hours: f64) -> Estimate {
    let price = pricing.filament_cost(filament_grams)
        + pricing.time_cost(time_hours)
        + pricing.flat_cost();
    Estimate {
        filament_grams,
        time_hours,
        price,
    }
}

/// Filament priced per kilogram, time priced by printer electricity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumetricPricing {
    pub price_per_kg: f64,
    pub printer_power_watts: f64,
    pub price_per_kwh: f64,
    pub extra_cost: f64,
}

impl VolumetricPricing {
    pub fn new(price_per_kg: Option<f64>, speed: &PrintSpeedModel) -> Self {
        Self {
            price_per_kg: price_per_kg.unwrap_or(DEFAULT_PRICE_PER_KG),
            printer_power_watts: speed.printer_power_watts,
            price_per_kwh: speed.price_per_kwh,
            extra_cost: speed.extra_cost,
        }
    }
}

impl PriceModel for VolumetricPricing {
    fn filament_cost(&self, grams: f64) -> f64 {
        (grams / 1000.0) * self.price_per_kg
    }

    fn time_cost(&self, hours: f64) -> f64 {
        ((self.printer_power_watts * hours) / 1000.0) * self.price_per_kwh
    }

    fn flat_cost(&self) -> f64 {
        self.extra_cost
    }
}

/// Volume after uniform scaling, in mm³.
pub fn scaled_volume(request: &EstimateRequest) -> f64 {
    request.volume_mm3 * request.scale.powf(3.0)
}

/// Volume after uniform scaling and infill discount, in mm³.
pub fn adjusted_volume(request: &EstimateRequest) -> f64 {
    infill_share(scaled_volume(request), request.infill_percent)
}

fn infill_share(scaled: f64, infill_percent: f64) -> f64 {
    scaled * (infill_percent / 100.0)
}

/// Volumetric estimate of filament mass, print time and price.
///
/// Pure: the same request always yields the same bits.
///
/// # Errors
///
/// Returns `DegenerateGeometry` when the scaled volume is not positive.
pub fn estimate(request: &EstimateRequest) -> GeometryResult<Estimate> {
    let scaled = scaled_volume(request);
    if !(scaled > 0.0) || !scaled.is_finite() {
        return Err(GeometryError::DegenerateGeometry);
    }

    let adjusted = infill_share(scaled, request.infill_percent);
    let filament_grams = (adjusted / 1000.0) * request.density;

    let time_minutes = adjusted.cbrt() * request.speed_model.minutes_per_cbrt_mm3;
    let time_hours = time_minutes / 60.0;

    let pricing = VolumetricPricing::new(request.price_per_kg, &request.speed_model);
    Ok(quote(&pricing, filament_grams, time_hours))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn request(volume: f64, infill: f64) -> EstimateRequest {
        EstimateRequest {
            volume_mm3: volume,
            scale: 1.0,
            infill_percent: infill,
            density: 1.24,
            price_per_kg: None,
            speed_model: PrintSpeedModel::default(),
        }
    }

    #[test]
    fn test_full_infill_grams() {
        let e = estimate(&request(1000.0, 100.0)).unwrap();
        assert_relative_eq!(e.filament_grams, 1.24, max_relative = 1e-12);
    }

    #[test]
    fn test_half_infill_grams() {
        let e = estimate(&request(1000.0, 50.0)).unwrap();
        assert_relative_eq!(e.filament_grams, 0.62, max_relative = 1e-12);
    }

    #[test]
    fn test_time_and_price() {
        let e = estimate(&request(1000.0, 100.0)).unwrap();
        // cbrt(1000) * 10 = 100 min
        assert_relative_eq!(e.time_hours, 100.0 / 60.0, max_relative = 1e-12);

        let filament_cost = (1.24 / 1000.0) * 25.0;
        let electricity = ((150.0 * (100.0 / 60.0)) / 1000.0) * 0.3;
        assert_relative_eq!(e.price, filament_cost + electricity, max_relative = 1e-12);
    }

    #[test]
    fn test_scale_is_cubic() {
        let mut r = request(1000.0, 100.0);
        r.scale = 2.0;
        let e = estimate(&r).unwrap();
        assert_relative_eq!(e.filament_grams, 8.0 * 1.24, max_relative = 1e-12);
        assert_relative_eq!(adjusted_volume(&r), 8000.0, max_relative = 1e-12);
    }

    #[test]
    fn test_estimate_matches_volume_helpers() {
        let mut r = request(1234.5, 37.0);
        r.scale = 1.7;
        let e = estimate(&r).unwrap();
        assert_eq!(scaled_volume(&r), 1234.5 * 1.7f64.powf(3.0));
        assert_eq!(e.filament_grams, (adjusted_volume(&r) / 1000.0) * r.density);
    }

    #[test]
    fn test_configured_price_per_kg() {
        let mut r = request(1000.0, 100.0);
        r.price_per_kg = Some(50.0);
        r.speed_model.price_per_kwh = 0.0;
        let e = estimate(&r).unwrap();
        assert_relative_eq!(e.price, (1.24 / 1000.0) * 50.0, max_relative = 1e-12);
    }

    #[test]
    fn test_extra_cost_added() {
        let mut r = request(1000.0, 100.0);
        let base = estimate(&r).unwrap().price;
        r.speed_model.extra_cost = 2.5;
        assert_relative_eq!(estimate(&r).unwrap().price, base + 2.5, max_relative = 1e-12);
    }

    #[test]
    fn test_zero_volume_is_degenerate() {
        assert_eq!(
            estimate(&request(0.0, 100.0)),
            Err(GeometryError::DegenerateGeometry)
        );
        let mut r = request(1000.0, 100.0);
        r.scale = 0.0;
        assert_eq!(estimate(&r), Err(GeometryError::DegenerateGeometry));
    }

    #[test]
    fn test_zero_infill_still_estimates() {
        let e = estimate(&request(1000.0, 0.0)).unwrap();
        assert_eq!(e.filament_grams, 0.0);
        assert_eq!(e.time_hours, 0.0);
        assert_eq!(e.price, 0.0);
    }

    #[test]
    fn test_reproducible_bits() {
        let r = request(1234.5678, 15.0);
        let a = estimate(&r).unwrap();
        let b = estimate(&r).unwrap();
        assert_eq!(a.filament_grams.to_bits(), b.filament_grams.to_bits());
        assert_eq!(a.time_hours.to_bits(), b.time_hours.to_bits());
        assert_eq!(a.price.to_bits(), b.price.to_bits());
    }

    struct FlatRate;

    impl PriceModel for FlatRate {
        fn filament_cost(&self, grams: f64) -> f64 {
            grams
        }
        fn time_cost(&self, hours: f64) -> f64 {
            hours * 10.0
        }
        fn flat_cost(&self) -> f64 {
            1.0
        }
    }

    #[test]
    fn test_quote_sums_components() {
        let e = quote(&FlatRate, 2.0, 3.0);
        assert_eq!(e.price, 2.0 + 30.0 + 1.0);
        assert_eq!(e.filament_grams, 2.0);
        assert_eq!(e.time_hours, 3.0);
    }
}

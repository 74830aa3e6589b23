/// The unit a precision measurement is reported in.
///
/// Distances are measured in millimeters internally; the discriminant is the
/// number of millimeters in one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeasureUnit {
    #[default]
    Millimeters = 1,
    Centimeters = 10,
    Meters = 1000,
}

impl MeasureUnit {
    /// Millimeters per unit. Never zero.
    pub fn scale(self) -> f64 {
        self as u32 as f64
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            MeasureUnit::Millimeters => "mm",
            MeasureUnit::Centimeters => "cm",
            MeasureUnit::Meters => "m",
        }
    }
}

/// Express a millimeter distance in `unit`.
pub fn convert(millimeters: f64, unit: MeasureUnit) -> f64 {
    millimeters / unit.scale()
}

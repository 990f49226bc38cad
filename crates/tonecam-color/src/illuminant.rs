//! Reference whites for the Lab conversion.

/// CIE XYZ tristimulus values of a reference white, Y normalized to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Illuminant {
    /// X
    pub x: f32,
    /// Y
    pub y: f32,
    /// Z
    pub z: f32,
}

/// CIE standard illuminant D65 (2 degree observer).
pub const D65: Illuminant = Illuminant {
    x: 0.950489,
    y: 1.0,
    z: 1.088840,
};

/// CIE standard illuminant D50 (2 degree observer).
pub const D50: Illuminant = Illuminant {
    x: 0.964212,
    y: 1.0,
    z: 0.825188,
};

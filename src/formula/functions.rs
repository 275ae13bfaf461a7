//! Builtin functions callable from formulas
//!
//! Dispatch is by exact (case-sensitive) name. Unknown names are not a
//! parse error: a formula may call them on a branch that never runs, so
//! the evaluator reports them only when the call is reached.

/// Scalar math functions taking exactly one numeric argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFn {
    Abs,
    Acos,
    Asin,
    Atan,
    Cbrt,
    Ceil,
    Cos,
    Cosh,
    Exp,
    Floor,
    Log,
    Log10,
    Signum,
    Sin,
    Sinh,
    Sqrt,
    Tan,
    Tanh,
    ToDegrees,
    ToRadians,
}

impl MathFn {
    pub fn apply(self, x: f64) -> f64 {
        match self {
            MathFn::Abs => x.abs(),
            MathFn::Acos => x.acos(),
            MathFn::Asin => x.asin(),
            MathFn::Atan => x.atan(),
            MathFn::Cbrt => x.cbrt(),
            MathFn::Ceil => x.ceil(),
            MathFn::Cos => x.cos(),
            MathFn::Cosh => x.cosh(),
            MathFn::Exp => x.exp(),
            MathFn::Floor => x.floor(),
            // Natural logarithm
            MathFn::Log => x.ln(),
            MathFn::Log10 => x.log10(),
            MathFn::Signum => signum(x),
            MathFn::Sin => x.sin(),
            MathFn::Sinh => x.sinh(),
            MathFn::Sqrt => x.sqrt(),
            MathFn::Tan => x.tan(),
            MathFn::Tanh => x.tanh(),
            MathFn::ToDegrees => x.to_degrees(),
            MathFn::ToRadians => x.to_radians(),
        }
    }
}

/// Sign that keeps zero (and its sign) and NaN, unlike `f64::signum`
fn signum(x: f64) -> f64 {
    if x.is_nan() || x == 0.0 {
        x
    } else if x > 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// What a call expression resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Math(MathFn),
    /// Current value of a data source
    ParameterValue,
    /// Current acquisition status of a data source
    ParameterAcquisitionStatus,
    /// Diagnostic logging; evaluates to `undefined`
    Print,
}

/// Call names of the data-source accessors
pub const PARAMETER_VALUE: &str = "parameterValue";
pub const PARAMETER_ACQUISITION_STATUS: &str = "parameterAcquisitionStatus";

/// Resolve a call name
pub fn lookup(name: &str) -> Option<Builtin> {
    let math = match name {
        "abs" => MathFn::Abs,
        "acos" => MathFn::Acos,
        "asin" => MathFn::Asin,
        "atan" => MathFn::Atan,
        "cbrt" => MathFn::Cbrt,
        "ceil" => MathFn::Ceil,
        "cos" => MathFn::Cos,
        "cosh" => MathFn::Cosh,
        "exp" => MathFn::Exp,
        "floor" => MathFn::Floor,
        "log" => MathFn::Log,
        "log10" => MathFn::Log10,
        "signum" | "sign" => MathFn::Signum,
        "sin" => MathFn::Sin,
        "sinh" => MathFn::Sinh,
        "sqrt" => MathFn::Sqrt,
        "tan" => MathFn::Tan,
        "tanh" => MathFn::Tanh,
        "toDegrees" => MathFn::ToDegrees,
        "toRadians" => MathFn::ToRadians,
        PARAMETER_VALUE => return Some(Builtin::ParameterValue),
        PARAMETER_ACQUISITION_STATUS => return Some(Builtin::ParameterAcquisitionStatus),
        "print" => return Some(Builtin::Print),
        _ => return None,
    };
    Some(Builtin::Math(math))
}

/// Whether `name` is one of the data-source accessors
pub fn is_accessor(name: &str) -> bool {
    matches!(
        lookup(name),
        Some(Builtin::ParameterValue | Builtin::ParameterAcquisitionStatus)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_math_set() {
        for name in [
            "abs", "acos", "asin", "atan", "cbrt", "ceil", "cos", "cosh", "exp", "floor", "log",
            "log10", "signum", "sign", "sin", "sinh", "sqrt", "tan", "tanh", "toDegrees",
            "toRadians",
        ] {
            assert!(
                matches!(lookup(name), Some(Builtin::Math(_))),
                "'{}' should be a math builtin",
                name
            );
        }
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(lookup("SQRT"), None);
        assert_eq!(lookup("todegrees"), None);
        assert_eq!(lookup("pow"), None);
    }

    #[test]
    fn test_accessors() {
        assert!(is_accessor("parameterValue"));
        assert!(is_accessor("parameterAcquisitionStatus"));
        assert!(!is_accessor("print"));
        assert_eq!(lookup("print"), Some(Builtin::Print));
    }

    #[test]
    fn test_math_values() {
        assert!((MathFn::Cbrt.apply(27.0) - 3.0).abs() < 1e-12);
        assert!((MathFn::Log.apply(std::f64::consts::E) - 1.0).abs() < 1e-12);
        assert!((MathFn::Log10.apply(1000.0) - 3.0).abs() < 1e-12);
        assert!((MathFn::ToDegrees.apply(std::f64::consts::PI) - 180.0).abs() < 1e-12);
        assert!((MathFn::ToRadians.apply(180.0) - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_signum_keeps_zero_and_nan() {
        assert_eq!(MathFn::Signum.apply(-3.5), -1.0);
        assert_eq!(MathFn::Signum.apply(2.0), 1.0);
        assert_eq!(MathFn::Signum.apply(0.0), 0.0);
        assert!(MathFn::Signum.apply(f64::NAN).is_nan());
    }
}

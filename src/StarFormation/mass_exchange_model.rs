//! # Mass Exchange Model
//!
//! Right-hand side of the simple star formation model. Three phases exchange mass:
//! atomic gas `a`, molecular gas `m` and active stars `s` (all mass fractions).
//!
//! ```text
//! da/dt = s - k1*a*m^2
//! dm/dt = k1*a*m^2 - k2*s*m^alpha
//! ds/dt = -s + k2*s*m^alpha
//! ```
//!
//! The three rates sum to zero, so a + m + s = 1 holds for the exact solution; numerical
//! drift of that sum is what the integrators are compared on.
//!
//! ## Main structures
//! - [`ParameterSet`]: immutable record of `k1`, `k2`, `alpha`, `a0`, `m0`
//! - [`State`]: instantaneous mass fractions `(a, m, s)`
//! - [`MassExchangeModel`]: vectorised right-hand side `F(t, [a, m, s])` and its symbolic form
//!
//! ## Non-obvious details
//! - `s` is always an integrated variable. Recovering it as `1 - a - m` accumulates rounding
//!   error which, for fractional `alpha`, pushes `m^alpha` out of the real domain.
//! - A fractional `alpha` with negative `m` yields NaN; this is propagated, not handled.
//!
//! ## Usage
//! ```rust, ignore
//! let params = ParameterSet::from_json(r#"{"k1":10,"k2":10,"alpha":1.0,"a0":0.15,"m0":0.15}"#)?;
//! let model = MassExchangeModel::new(params);
//! let dydt = model.rhs(0.0, &params.initial_state().to_array());
//! ```
use super::sf_error::StarFormationError;
use RustedSciThe::symbolic::symbolic_engine::Expr;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// names of the integrated variables, in state vector order
pub const UNKNOWNS: [&str; 3] = ["a", "m", "s"];
/// name of the independent variable
pub const ARGUMENT: &str = "t";
/// recognised keys of a parameter set
pub const PARAMETER_KEYS: [&str; 5] = ["k1", "k2", "alpha", "a0", "m0"];

/// Constants of one model run.
///
/// # Fields
/// - `k1`: molecular cloud formation rate constant
/// - `k2`: star formation rate constant
/// - `alpha`: exponent of the star formation term
/// - `a0`, `m0`: atomic and molecular mass fractions at t = 0
///
/// The active star fraction at t = 0 is derived as `1 - a0 - m0`. A physically valid run
/// needs `a0, m0 >= 0` and `a0 + m0 <= 1`; this is reported, not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub k1: f64,
    pub k2: f64,
    pub alpha: f64,
    pub a0: f64,
    pub m0: f64,
}

impl ParameterSet {
    pub const fn new(k1: f64, k2: f64, alpha: f64, a0: f64, m0: f64) -> Self {
        Self {
            k1,
            k2,
            alpha,
            a0,
            m0,
        }
    }

    /// Builds a parameter set from a key-value map.
    ///
    /// All keys of [`PARAMETER_KEYS`] are required. Other keys (for example a redundant `s0`)
    /// are ignored with a warning since `s0` is always derived from `a0` and `m0`.
    ///
    /// # Returns
    /// * `Ok(ParameterSet)` - all keys present and finite
    /// * `Err(StarFormationError::InvalidInput)` - missing key or non-finite value
    pub fn from_map(map: &HashMap<String, f64>) -> Result<Self, StarFormationError> {
        let get = |key: &str| -> Result<f64, StarFormationError> {
            map.get(key).copied().ok_or_else(|| {
                StarFormationError::InvalidInput(format!("missing required key '{}'", key))
            })
        };
        for key in map.keys() {
            if !PARAMETER_KEYS.contains(&key.as_str()) {
                warn!("ignoring unrecognised parameter key '{}'", key);
            }
        }
        let params = Self::new(get("k1")?, get("k2")?, get("alpha")?, get("a0")?, get("m0")?);
        params.validate()?;
        Ok(params)
    }

    /// Parses a JSON object such as `{"k1":8,"k2":15,"alpha":1.3,"a0":0.4,"m0":0.2}`.
    pub fn from_json(json: &str) -> Result<Self, StarFormationError> {
        let params: ParameterSet = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_map(&self) -> HashMap<String, f64> {
        HashMap::from([
            ("k1".to_owned(), self.k1),
            ("k2".to_owned(), self.k2),
            ("alpha".to_owned(), self.alpha),
            ("a0".to_owned(), self.a0),
            ("m0".to_owned(), self.m0),
        ])
    }

    /// copy with another exponent
    pub fn with_alpha(&self, alpha: f64) -> Self {
        Self { alpha, ..*self }
    }

    /// copy with other initial fractions
    pub fn with_initial_fractions(&self, a0: f64, m0: f64) -> Self {
        Self { a0, m0, ..*self }
    }

    /// initial active star fraction
    pub fn s0(&self) -> f64 {
        1.0 - self.a0 - self.m0
    }

    pub fn initial_state(&self) -> State {
        State::new(self.a0, self.m0, self.s0())
    }

    /// Checks that every constant is finite. Physically questionable initial fractions are
    /// only reported.
    pub fn validate(&self) -> Result<(), StarFormationError> {
        let values = [self.k1, self.k2, self.alpha, self.a0, self.m0];
        for (key, value) in PARAMETER_KEYS.iter().zip(values.iter()) {
            if !value.is_finite() {
                return Err(StarFormationError::InvalidInput(format!(
                    "parameter '{}' must be finite, got {}",
                    key, value
                )));
            }
        }
        if self.a0 < 0.0 || self.m0 < 0.0 || self.s0() < 0.0 {
            warn!(
                "initial fractions a0 = {}, m0 = {}, s0 = {} are not a valid mass partition",
                self.a0,
                self.m0,
                self.s0()
            );
        }
        Ok(())
    }
}

/// Mass fractions at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// atomic gas
    pub a: f64,
    /// molecular gas
    pub m: f64,
    /// active stars
    pub s: f64,
}

impl State {
    pub const fn new(a: f64, m: f64, s: f64) -> Self {
        Self { a, m, s }
    }

    pub fn from_array(y: [f64; 3]) -> Self {
        Self::new(y[0], y[1], y[2])
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.a, self.m, self.s]
    }

    /// a + m + s, equal to 1 for the exact solution
    pub fn total(&self) -> f64 {
        self.a + self.m + self.s
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.m.is_finite() && self.s.is_finite()
    }
}

/// da/dt = s - k1*a*m^2
pub fn rate_a(a: f64, m: f64, s: f64, params: &ParameterSet) -> f64 {
    s - a * params.k1 * m.powi(2)
}

/// dm/dt = k1*a*m^2 - k2*s*m^alpha
pub fn rate_m(a: f64, m: f64, s: f64, params: &ParameterSet) -> f64 {
    a * params.k1 * m.powi(2) - params.k2 * s * m.powf(params.alpha)
}

/// ds/dt = -s + k2*s*m^alpha
pub fn rate_s(m: f64, s: f64, params: &ParameterSet) -> f64 {
    -s + params.k2 * s * m.powf(params.alpha)
}

/// Vectorised right-hand side of the model for one parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassExchangeModel {
    params: ParameterSet,
}

impl MassExchangeModel {
    pub fn new(params: ParameterSet) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// F(t, [a, m, s]); the model is autonomous so `t` is unused
    pub fn rhs(&self, _t: f64, y: &[f64; 3]) -> [f64; 3] {
        let [a, m, s] = *y;
        [
            rate_a(a, m, s, &self.params),
            rate_m(a, m, s, &self.params),
            rate_s(m, s, &self.params),
        ]
    }

    /// all three rates evaluated from the same snapshot
    pub fn derivatives(&self, state: &State) -> State {
        State::from_array(self.rhs(0.0, &state.to_array()))
    }

    /// The same system as symbolic expressions over the variables [`UNKNOWNS`].
    pub fn symbolic_rhs(&self) -> Vec<Expr> {
        let a = Expr::Var(UNKNOWNS[0].to_owned());
        let m = Expr::Var(UNKNOWNS[1].to_owned());
        let s = Expr::Var(UNKNOWNS[2].to_owned());
        let k1 = Expr::Const(self.params.k1);
        let k2 = Expr::Const(self.params.k2);
        let m_squared = Expr::Pow(Box::new(m.clone()), Box::new(Expr::Const(2.0)));
        let m_alpha = Expr::Pow(Box::new(m), Box::new(Expr::Const(self.params.alpha)));
        // k1*a*m^2 and k2*s*m^alpha appear twice each
        let cloud_formation = k1 * a * m_squared;
        let star_formation = k2 * s.clone() * m_alpha;

        let da = s.clone() - cloud_formation.clone();
        let dm = cloud_formation - star_formation.clone();
        let ds = star_formation - s;
        vec![da, dm, ds]
    }
}

/// error type shared by every part of the star formation toolkit
pub mod sf_error;
/// eng
/// Right-hand side of the simple star formation model: three coupled ODEs for the mass
/// fractions of atomic gas a(t), molecular gas m(t) and active stars s(t)
///
///  da/dt = s - k1*a*m^2
///  dm/dt = k1*a*m^2 - k2*s*m^alpha
///  ds/dt = -s + k2*s*m^alpha
///
/// s is integrated as an independent variable, it is never recovered from 1 - a - m:
/// the rounding error of that identity drives m^alpha into the complex domain for fractional alpha.
/// The module also holds the parameter set (k1, k2, alpha, a0, m0) and the symbolic form of the
/// system used by the RustedSciThe solvers.
pub mod mass_exchange_model;
/// named parameter sets and run settings of the classical scenarios (six cases of the
/// phase portrait study and the alpha sweep 1.3 ... 1.9)
pub mod parameter_sets;
/// time series produced by every integrator: time column plus a(t), m(t), s(t)
pub mod trajectory;
/// Integrator trait and the IntegrationMethod enum dispatching over all methods
pub mod integrator;
/// fixed-step explicit integrators: forward Euler and four-stage Runge-Kutta
pub mod fixed_step;
/// eng
/// Adaptive step integration. The embedded Runge-Kutta 4(5) solver is an injected capability
/// (trait AdaptiveSolver): a native Dormand-Prince implementation with dense output and a
/// backend delegating to the RustedSciThe UniversalODESolver are provided.
/// Both return trajectories sampled at equally spaced points of [0, T].
pub mod adaptive;
/// limit period of the active star fraction: spacing of the last two steady-state maxima
pub mod limit_period;
/// runs integrators over an ordered list of parameter sets and collects one period per
/// case per method
pub mod sweep;

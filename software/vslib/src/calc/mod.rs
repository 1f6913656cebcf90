//! Calculations that are run at each control cycle.
//!
//! Each calc wraps part of the numerical core for a cyclic executive that
//! owns a flat tape of `f64` signal values. A calc reads its inputs from the
//! tape indices it was given during `init` and writes its outputs into its
//! output range. Calcs are serialized polymorphically with a `type` tag.
use std::{collections::BTreeMap, ops::Range};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

mod dq0;
mod pid;
mod rst;
mod sin;

pub use dq0::Dq0;
pub use pid::Pid;
pub use rst::Rst;
pub use sin::Sin;

use crate::context::ControllerCtx;
use crate::control::RangeLimiter;

// Type aliases for clarification purposes, since
// there will be a lot of strings and usize ints
pub type FieldName = String;

pub type CalcName = String;
pub type CalcInputName = String;
pub type CalcOutputName = String;
pub type CalcConfigName = String;

/// Calcs that can be prototyped
pub trait CalcProto {
    fn prototype() -> (CalcName, Box<dyn Calc>);
}

impl<T> CalcProto for T
where
    T: Calc + Default + 'static,
{
    fn prototype() -> (CalcName, Box<dyn Calc>) {
        let full_name = std::any::type_name::<T>();
        let name = full_name.rsplit("::").next().unwrap_or(full_name).to_owned();
        let proto: Box<dyn Calc> = Box::new(T::default());

        (name, proto)
    }
}

/// Prototypes of each calc
pub static PROTOTYPES: Lazy<BTreeMap<CalcName, Box<dyn Calc>>> = Lazy::new(|| {
    BTreeMap::<CalcName, Box<dyn Calc>>::from([
        Dq0::prototype(),
        Pid::prototype(),
        Rst::prototype(),
        Sin::prototype(),
    ])
});

/// A calculation that takes some inputs and produces some outputs
/// at each timestep, and may have some persistent internal state.
#[typetag::serde(tag = "type")]
pub trait Calc: Send + Sync {
    /// Validate configuration, reset internal state and register calc tape indices
    fn init(
        &mut self,
        ctx: ControllerCtx,
        input_indices: Vec<usize>,
        output_range: Range<usize>,
    ) -> Result<(), String>;

    /// Clear state to reset for another run
    fn terminate(&mut self);

    /// Run calcs for a cycle
    fn eval(&mut self, tape: &mut [f64]);

    /// Map from input field names (like `measurement`) to the tape signal
    /// that the input should draw from (like `sensor_0.current`)
    fn get_input_map(&self) -> BTreeMap<CalcInputName, FieldName>;

    /// Change a value in the input map
    fn update_input_map(&mut self, field: &str, source: &str) -> Result<(), String>;

    //
    // Everything below this point can be macro-generated

    /// Get config field values
    fn get_config(&self) -> BTreeMap<CalcConfigName, f64>;

    /// Apply config field values
    fn set_config(&mut self, cfg: &BTreeMap<CalcConfigName, f64>) -> Result<(), String>;

    //
    // These are needed to maintain strict ordering for indexed evaluation

    /// List of input field names in the order that they will be consumed
    fn get_input_names(&self) -> Vec<CalcInputName>;

    /// List of output field names in the order that they will be written out
    fn get_output_names(&self) -> Vec<CalcOutputName>;
}

/// Check that the orchestrator handed over as many tape slots as the calc has fields.
fn check_indices(
    calc: &dyn Calc,
    input_indices: &[usize],
    output_range: &Range<usize>,
) -> Result<(), String> {
    let n_inputs = calc.get_input_names().len();
    if input_indices.len() != n_inputs {
        return Err(format!(
            "Expected {n_inputs} input indices, got {}",
            input_indices.len()
        ));
    }
    let n_outputs = calc.get_output_names().len();
    if output_range.len() != n_outputs {
        return Err(format!(
            "Expected {n_outputs} outputs, got range {output_range:?}"
        ));
    }

    Ok(())
}

/// Sampling period in seconds, rejecting a zero cycle period.
fn sampling_period(ctx: &ControllerCtx) -> Result<f64, String> {
    if ctx.dt_ns == 0 {
        return Err("dt_ns value of 0 provided. dt_ns must be > 0".to_owned());
    }
    Ok(ctx.dt_s())
}

/// Build the actuation limiter from a calc's `min`/`max` config
fn actuation_limits(min: f64, max: f64) -> Result<RangeLimiter, String> {
    RangeLimiter::new(min, max).map_err(String::from)
}

/// Build functions for getting and setting calc config fields
#[macro_export]
macro_rules! calc_config {
    ($( $field:ident ),*) => {
        /// Get config field values
        fn get_config(&self) -> BTreeMap<CalcConfigName, f64> {
            #[allow(unused_mut)]
            let mut cfg = BTreeMap::<CalcConfigName, f64>::new();
            $({cfg.insert(stringify!($field).to_owned(), self.$field);})*

            cfg
        }

        /// Apply config field values
        #[allow(unused)]
        fn set_config(&mut self, cfg: &BTreeMap<CalcConfigName, f64>) -> Result<(), String> {
            $({
                let f = stringify!($field);
                self.$field = *cfg.get(f).ok_or(format!("Config missing key `{f}`"))?;
            })*

            Ok(())
        }
    }
}

/// Build function for getting calc input field names
#[macro_export]
macro_rules! calc_input_names {
    ($( $field:ident ),*) => {
        /// List of input field names in the order that they will be consumed
        fn get_input_names(&self) -> Vec<CalcInputName> {
            #[allow(unused_mut)]
            let mut names = vec![];
            $({
                names.push(stringify!($field).to_owned());
            })*

            names
        }
    }
}

/// Build function for getting calc output field names
#[macro_export]
macro_rules! calc_output_names {
    ($( $field:ident ),*) => {
        /// List of output field names in the order that they will be written out
        fn get_output_names(&self) -> Vec<CalcOutputName> {
            let mut names = vec![];
            $({
                names.push(stringify!($field).to_owned());
            })*

            names
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prototypes_are_named_by_type() {
        let names: Vec<&str> = PROTOTYPES.keys().map(String::as_str).collect();
        assert_eq!(names, ["Dq0", "Pid", "Rst", "Sin"]);
    }

    #[test]
    fn test_ser_roundtrip() {
        let calcs: Vec<Box<dyn Calc>> = vec![
            Box::new(Pid::new(
                "ref".to_owned(),
                "meas".to_owned(),
                Default::default(),
                -10.0,
                10.0,
            )),
            Box::new(Sin::new(1e-2, 0.0, -1.0, 1.0)),
        ];

        let serialized = serde_json::to_string(&calcs).unwrap();
        let deserialized = serde_json::from_str::<Vec<Box<dyn Calc>>>(&serialized).unwrap();
        let reserialized = serde_json::to_string(&deserialized).unwrap();

        assert_eq!(serialized, reserialized);
        assert!(serialized.contains(r#""type":"Pid""#), "{serialized}");
    }

    #[test]
    fn config_round_trips_through_map() {
        for (name, proto) in PROTOTYPES.iter() {
            let cfg = proto.get_config();
            let mut calc: Box<dyn Calc> =
                serde_json::from_str(&serde_json::to_string(proto).unwrap()).unwrap();
            calc.set_config(&cfg).unwrap();
            assert_eq!(calc.get_config(), cfg, "{name}");

            let mut partial = cfg.clone();
            if let Some(first) = cfg.keys().next() {
                partial.remove(first);
                assert!(calc.set_config(&partial).is_err(), "{name}");
            }
        }
    }

    #[test]
    fn serialized_fields_are_config_or_wiring() {
        for (name, proto) in PROTOTYPES.iter() {
            let value = serde_json::to_value(proto).unwrap();
            let cfg = proto.get_config();
            for key in value.as_object().unwrap().keys() {
                let wiring = key == "type" || key.ends_with("_name");
                assert!(wiring || cfg.contains_key(key), "{name}.{key}");
            }
        }
    }

    #[test]
    fn input_map_matches_input_names() {
        for (name, proto) in PROTOTYPES.iter() {
            let map = proto.get_input_map();
            let mut names = proto.get_input_names();
            names.sort();
            assert_eq!(map.keys().cloned().collect::<Vec<_>>(), names, "{name}");
        }
    }
}

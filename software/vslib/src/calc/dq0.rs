//! Three-phase quantities projected onto a rotating frame

use super::*;
use crate::transform::{Abc, AbcToDq0Transform};
use crate::{calc_config, calc_input_names, calc_output_names};

/// abc to dq0 transform of three phase signals at the angle `theta` (rad).
///
/// `offset` (rad) is added to `theta`, shifting the d axis away from phase a.
#[derive(Serialize, Deserialize, Default, Debug)]
pub struct Dq0 {
    // User inputs
    a_name: String,
    b_name: String,
    c_name: String,
    theta_name: String,
    offset: f64,

    // Values provided by calc orchestrator during init
    #[serde(skip)]
    input_indices: Vec<usize>,

    #[serde(skip)]
    output_range: Range<usize>,

    #[serde(skip)]
    transform: AbcToDq0Transform,
}

impl Dq0 {
    pub fn new(
        a_name: String,
        b_name: String,
        c_name: String,
        theta_name: String,
        offset: f64,
    ) -> Self {
        Self {
            a_name,
            b_name,
            c_name,
            theta_name,
            offset,
            input_indices: vec![],
            output_range: usize::MAX..usize::MAX,
            transform: AbcToDq0Transform::default(),
        }
    }
}

#[typetag::serde]
impl Calc for Dq0 {
    /// Register calc tape indices
    fn init(
        &mut self,
        _: ControllerCtx,
        input_indices: Vec<usize>,
        output_range: Range<usize>,
    ) -> Result<(), String> {
        check_indices(self, &input_indices, &output_range)?;
        self.input_indices = input_indices;
        self.output_range = output_range;
        Ok(())
    }

    fn terminate(&mut self) {
        self.input_indices.clear();
        self.output_range = usize::MAX..usize::MAX;
    }

    /// Run calcs for a cycle
    fn eval(&mut self, tape: &mut [f64]) {
        let abc = Abc {
            a: tape[self.input_indices[0]],
            b: tape[self.input_indices[1]],
            c: tape[self.input_indices[2]],
        };
        let theta = tape[self.input_indices[3]];
        let dq0 = self.transform.transform(abc, theta, self.offset);

        let out = &mut tape[self.output_range.clone()];
        out[0] = dq0.d;
        out[1] = dq0.q;
        out[2] = dq0.zero;
    }

    fn get_input_map(&self) -> BTreeMap<CalcInputName, FieldName> {
        BTreeMap::from([
            ("a".to_owned(), self.a_name.clone()),
            ("b".to_owned(), self.b_name.clone()),
            ("c".to_owned(), self.c_name.clone()),
            ("theta".to_owned(), self.theta_name.clone()),
        ])
    }

    fn update_input_map(&mut self, field: &str, source: &str) -> Result<(), String> {
        let name = match field {
            "a" => &mut self.a_name,
            "b" => &mut self.b_name,
            "c" => &mut self.c_name,
            "theta" => &mut self.theta_name,
            _ => return Err(format!("Unrecognized field {field}")),
        };
        *name = source.to_owned();

        Ok(())
    }

    calc_config!(offset);
    calc_input_names!(a, b, c, theta);
    calc_output_names!(d, q, zero);
}

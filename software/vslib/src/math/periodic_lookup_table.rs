//! Linear interpolation over one tabulated period of a periodic function.
//!
//! Queries outside the tabulated domain are folded back into it, so a table
//! holding `[0, 2π]` of a sine answers for any angle. The last interpolated
//! section is cached, which makes repeated or slowly advancing queries from a
//! control loop O(1) without a search.

use core::ops::Index;

/// Strategy for locating the section that brackets a query.
/// Decided once when the table data is set.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Binning {
    /// Samples are `bin_size` apart, so the section index follows from the position of `x`
    Equal { bin_size: f64 },

    /// Irregular spacing; the section is found by a linear or binary search
    Irregular,
}

/// One period of a function, tabulated as `(x, y)` samples with strictly increasing `x`.
#[derive(Clone, Debug)]
pub struct PeriodicLookupTable {
    data: Vec<(f64, f64)>,
    lower_edge_x: f64,
    upper_edge_x: f64,
    span_x: f64,
    binning: Binning,

    // Section cache. Only affects speed, never the interpolated values.
    previous_section_x: (f64, f64),
    previous_section_y: f64,
    previous_section_index: usize,
    interpolation_factor: f64,
}

impl PeriodicLookupTable {
    /// Validate and store a table.
    ///
    /// `equal_binning` asserts that the samples are equally spaced, which enables
    /// direct index computation instead of a search.
    pub fn new(data: Vec<(f64, f64)>, equal_binning: bool) -> Result<Self, String> {
        let mut table = Self {
            data: Vec::new(),
            lower_edge_x: 0.0,
            upper_edge_x: 0.0,
            span_x: 0.0,
            binning: Binning::Irregular,
            previous_section_x: (0.0, 0.0),
            previous_section_y: 0.0,
            previous_section_index: 1,
            interpolation_factor: 0.0,
        };
        table.set_data(data, equal_binning)?;
        Ok(table)
    }

    /// Replace the table contents and reset the section cache to the lower edge.
    pub fn set_data(&mut self, data: Vec<(f64, f64)>, equal_binning: bool) -> Result<(), String> {
        let (first, last) = match (data.first(), data.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err("Lookup table requires at least one sample".to_owned()),
        };
        if data.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err("Lookup table samples must be finite".to_owned());
        }
        if data.windows(2).any(|pair| pair[1].0 <= pair[0].0) {
            return Err("Lookup table x values must be strictly increasing".to_owned());
        }

        self.lower_edge_x = first.0;
        self.upper_edge_x = last.0;
        self.span_x = (last.0 - first.0).abs();
        self.binning = match data.get(1) {
            Some(second) if equal_binning => Binning::Equal {
                bin_size: second.0 - first.0,
            },
            _ => Binning::Irregular,
        };
        self.data = data;
        self.reset();

        Ok(())
    }

    /// Interpolate the tabulated function at `x`, folding `x` into the table's period first.
    ///
    /// `random_access` selects a binary search for irregularly spaced tables. Otherwise the
    /// search walks from the previous section, which is fastest when consecutive
    /// queries are close together. Tables with equal binning ignore the flag.
    pub fn interpolate(&mut self, x: f64, random_access: bool) -> f64 {
        let last = self.data.len() - 1;
        if last == 0 {
            return self.data[0].1;
        }

        let x = self.fold(x);

        if self.section_contains(x) {
            return self.previous_section_y + (x - self.previous_section_x.0) * self.interpolation_factor;
        }

        if x == self.lower_edge_x {
            self.cache_edge(0);
            return self.data[0].1;
        }
        if x == self.upper_edge_x {
            self.cache_edge(last);
            return self.data[last].1;
        }

        let index = match self.binning {
            Binning::Equal { bin_size } => self.index_search(x, bin_size),
            Binning::Irregular if random_access => self.binary_search(x),
            Binning::Irregular => self.linear_search(x),
        };

        let (x1, y1) = self.data[index - 1];
        let (x2, y2) = self.data[index];
        self.previous_section_x = (x1, x2);
        self.previous_section_y = y1;
        self.previous_section_index = index;
        self.interpolation_factor = (y2 - y1) / (x2 - x1);

        y1 + (x - x1) * self.interpolation_factor
    }

    /// Restore the section cache to its initial state at the lower edge.
    pub fn reset(&mut self) {
        self.cache_edge(0);
    }

    /// Number of stored samples
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a constructed table
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.data
    }

    pub fn lower_edge_x(&self) -> f64 {
        self.lower_edge_x
    }

    pub fn upper_edge_x(&self) -> f64 {
        self.upper_edge_x
    }

    pub fn span_x(&self) -> f64 {
        self.span_x
    }

    pub fn equal_binning(&self) -> bool {
        matches!(self.binning, Binning::Equal { .. })
    }

    /// Spacing between samples, if the table was declared equally binned
    pub fn bin_size(&self) -> Option<f64> {
        match self.binning {
            Binning::Equal { bin_size } => Some(bin_size),
            Binning::Irregular => None,
        }
    }

    /// Map `x` onto `[lower_edge_x, upper_edge_x]` by whole periods.
    /// Non-finite input lands on the upper edge.
    #[inline]
    fn fold(&self, x: f64) -> f64 {
        if x >= self.lower_edge_x && x <= self.upper_edge_x {
            return x;
        }

        let mut offset = (x - self.lower_edge_x) % self.span_x;
        if offset < 0.0 {
            offset += self.span_x;
        }
        (self.lower_edge_x + offset).min(self.upper_edge_x)
    }

    /// Sections are closed on the left and open on the right, except the zero-width
    /// sections cached for exact edge hits.
    #[inline]
    fn section_contains(&self, x: f64) -> bool {
        let (x1, x2) = self.previous_section_x;
        x >= x1 && (x < x2 || x == x1)
    }

    fn cache_edge(&mut self, index: usize) {
        let (x, y) = self.data[index];
        self.previous_section_x = (x, x);
        self.previous_section_y = y;
        self.previous_section_index = index.max(1);
        self.interpolation_factor = 0.0;
    }

    /// Right-hand index of the section holding `x`, computed from its position.
    fn index_search(&self, x: f64, bin_size: f64) -> usize {
        let last = self.data.len() - 1;
        let mut index = (((x - self.lower_edge_x) / bin_size) as usize + 1).clamp(1, last);

        // The division may round across a bin boundary
        if index < last && x >= self.data[index].0 {
            index += 1;
        } else if index > 1 && x < self.data[index - 1].0 {
            index -= 1;
        }
        index
    }

    /// Right-hand index of the section holding `x`, walking from the previous section.
    fn linear_search(&self, x: f64) -> usize {
        let last = self.data.len() - 1;
        let mut index = self.previous_section_index.clamp(1, last);

        while index < last && x >= self.data[index].0 {
            index += 1;
        }
        while index > 1 && x < self.data[index - 1].0 {
            index -= 1;
        }
        index
    }

    /// Right-hand index of the section holding `x`, by bisection.
    fn binary_search(&self, x: f64) -> usize {
        self.data
            .partition_point(|&(xi, _)| xi <= x)
            .clamp(1, self.data.len() - 1)
    }
}

impl Index<usize> for PeriodicLookupTable {
    type Output = f64;

    /// Stored y-value at a sample index, without interpolation
    fn index(&self, index: usize) -> &f64 {
        &self.data[index].1
    }
}

//! Parameter layout strategies over the shared flat buffer.
//!
//! Every parameterized layer pairs with a [`ParamInitializer`] that partitions
//! the layer's region of the network parameter buffer into named sub-views and
//! writes the initial values. The partitioning is deterministic: the same
//! configuration always produces the same names, offsets, and order, so a
//! buffer saved by one process can be adopted by another.

use std::ops::Range;

use crate::config::{BatchNormConfig, DenseConfig, DropoutConfig, NetworkContext};
use crate::error::ParameterSizeError;

/// Scale parameter of a batch normalization layer.
pub const GAMMA: &str = "gamma";
/// Shift parameter of a batch normalization layer.
pub const BETA: &str = "beta";
/// Running mean statistic of a batch normalization layer.
pub const RUNNING_MEAN: &str = "running_mean";
/// Running variance statistic of a batch normalization layer.
pub const RUNNING_VAR: &str = "running_var";
/// Weight matrix of a dense layer.
pub const WEIGHTS: &str = "weights";
/// Bias vector of a dense layer.
pub const BIASES: &str = "biases";

/// Contiguous sub-range of a parameter buffer.
///
/// Offsets are relative to the buffer the view is applied to: layer spans are
/// relative to the network buffer, named parameter views are relative to the
/// owning layer's span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParamView {
    pub offset: usize,
    pub len: usize,
}

impl ParamView {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// One past the last index covered by the view.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// Borrow the viewed region of `buf`.
    ///
    /// # Panics
    ///
    /// Panics if the view extends past the end of `buf`.
    pub fn slice<'a>(&self, buf: &'a [f32]) -> &'a [f32] {
        &buf[self.range()]
    }

    /// Mutably borrow the viewed region of `buf`.
    ///
    /// # Panics
    ///
    /// Panics if the view extends past the end of `buf`.
    pub fn slice_mut<'a>(&self, buf: &'a mut [f32]) -> &'a mut [f32] {
        &mut buf[self.range()]
    }
}

/// A named parameter view plus its trainability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamEntry {
    pub name: &'static str,
    pub view: ParamView,
    pub trainable: bool,
}

/// Insertion-ordered set of named parameter views for one layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamTable {
    entries: Vec<ParamEntry>,
}

impl ParamTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named view. Order of insertion is the canonical order.
    pub fn push(&mut self, name: &'static str, view: ParamView, trainable: bool) {
        self.entries.push(ParamEntry {
            name,
            view,
            trainable,
        });
    }

    pub fn get(&self, name: &str) -> Option<&ParamEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn view(&self, name: &str) -> Option<ParamView> {
        self.get(name).map(|e| e.view)
    }

    pub fn entries(&self) -> &[ParamEntry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.name)
    }

    /// Number of named views in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total length of all views, trainable or not.
    pub fn total_len(&self) -> usize {
        self.entries.iter().map(|e| e.view.len).sum()
    }

    /// Total length of the trainable views only.
    pub fn trainable_len(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.trainable)
            .map(|e| e.view.len)
            .sum()
    }

    /// Slice the named view out of the layer's parameter region.
    ///
    /// # Panics
    ///
    /// Panics if the name is not in the table.
    pub fn slice<'a>(&self, name: &str, params: &'a [f32]) -> &'a [f32] {
        match self.view(name) {
            Some(view) => view.slice(params),
            None => panic!("no parameter named '{}'", name),
        }
    }
}

/// Strategy that partitions a layer's parameter view and writes initial values.
///
/// `init` must be deterministic: the same configuration and context always
/// produce the same table and, when `initialize` is set, the same values.
/// Implementations check the view length before any write, so a failure
/// leaves the buffer untouched.
pub trait ParamInitializer {
    type Config;

    /// Number of buffer values the configuration requires.
    fn required_len(&self, conf: &Self::Config) -> usize;

    /// Partition `view` into named sub-views and optionally fill in the
    /// initial values. A view longer than required is tolerated; the table
    /// covers the leading region only.
    fn init(
        &self,
        conf: &Self::Config,
        ctx: &NetworkContext,
        index: usize,
        view: &mut [f32],
        initialize: bool,
    ) -> Result<ParamTable, ParameterSizeError>;
}

fn check_len(layer: &str, required: usize, view: &[f32]) -> Result<(), ParameterSizeError> {
    if view.len() < required {
        return Err(ParameterSizeError {
            layer: layer.to_string(),
            required,
            actual: view.len(),
        });
    }
    Ok(())
}

/// Parameter layout for batch normalization.
///
/// Four views of `n_out` values each, in canonical order: gamma, beta,
/// running mean, running variance. Gamma and beta start at the configured
/// constants and are trainable unless the configuration locks them; the
/// running statistics start at 0 and 1 and are never trainable.
pub struct BatchNormInitializer;

impl ParamInitializer for BatchNormInitializer {
    type Config = BatchNormConfig;

    fn required_len(&self, conf: &BatchNormConfig) -> usize {
        4 * conf.base.n_out
    }

    fn init(
        &self,
        conf: &BatchNormConfig,
        _ctx: &NetworkContext,
        _index: usize,
        view: &mut [f32],
        initialize: bool,
    ) -> Result<ParamTable, ParameterSizeError> {
        let n = conf.base.n_out;
        check_len(conf.display_name(), self.required_len(conf), view)?;

        let trainable = !conf.lock_gamma_beta;
        let mut table = ParamTable::new();
        table.push(GAMMA, ParamView::new(0, n), trainable);
        table.push(BETA, ParamView::new(n, n), trainable);
        table.push(RUNNING_MEAN, ParamView::new(2 * n, n), false);
        table.push(RUNNING_VAR, ParamView::new(3 * n, n), false);

        if initialize {
            view[..n].fill(conf.gamma);
            view[n..2 * n].fill(conf.beta);
            view[2 * n..3 * n].fill(0.0);
            view[3 * n..4 * n].fill(1.0);
        }

        Ok(table)
    }
}

/// Parameter layout for dense layers.
///
/// A row-major weight matrix of `n_in` × `n_out` values followed by `n_out`
/// biases. Weights use Xavier initialization from the context-seeded RNG,
/// biases start at zero.
pub struct DenseInitializer;

impl ParamInitializer for DenseInitializer {
    type Config = DenseConfig;

    fn required_len(&self, conf: &DenseConfig) -> usize {
        conf.base.n_in * conf.base.n_out + conf.base.n_out
    }

    fn init(
        &self,
        conf: &DenseConfig,
        ctx: &NetworkContext,
        index: usize,
        view: &mut [f32],
        initialize: bool,
    ) -> Result<ParamTable, ParameterSizeError> {
        let n_in = conf.base.n_in;
        let n_out = conf.base.n_out;
        let required = self.required_len(conf);
        check_len(conf.display_name(), required, view)?;

        let weight_len = n_in * n_out;
        let mut table = ParamTable::new();
        table.push(WEIGHTS, ParamView::new(0, weight_len), true);
        table.push(BIASES, ParamView::new(weight_len, n_out), true);

        if initialize {
            // Xavier initialization: limit = sqrt(6 / (fan_in + fan_out))
            let limit = (6.0f32 / (n_in + n_out) as f32).sqrt();
            let mut rng = ctx.layer_rng(index);
            for value in &mut view[..weight_len] {
                *value = rng.gen_range_f32(-limit, limit);
            }
            view[weight_len..required].fill(0.0);
        }

        Ok(table)
    }
}

/// Parameter layout for dropout: no parameters at all.
pub struct DropoutInitializer;

impl ParamInitializer for DropoutInitializer {
    type Config = DropoutConfig;

    fn required_len(&self, _conf: &DropoutConfig) -> usize {
        0
    }

    fn init(
        &self,
        _conf: &DropoutConfig,
        _ctx: &NetworkContext,
        _index: usize,
        _view: &mut [f32],
        _initialize: bool,
    ) -> Result<ParamTable, ParameterSizeError> {
        Ok(ParamTable::new())
    }
}

//! Architecture configuration, planning, and network assembly.
//!
//! This module provides configuration structures for defining whole network
//! architectures via JSON files, the planning step that threads input types
//! through the layer chain, and the assembly step that allocates the flat
//! parameter buffer and instantiates every layer against its span.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::config::{LayerConfig, NetworkContext};
use crate::error::{ConfigurationError, NetworkError, ParameterSizeError};
use crate::inputs::InputType;
use crate::layers::Layer;
use crate::listeners::TrainingListener;
use crate::params::ParamView;
use crate::preprocessor::InputPreProcessor;

/// Configuration for an entire network architecture.
///
/// Contains the layout of the data entering the first layer and the sequence
/// of layer configurations, applied in order. Layers may leave their input
/// sizes unresolved; planning fills them in from the declared input.
///
/// # Example
///
/// ```json
/// {
///   "input": { "kind": "feed_forward", "size": 784 },
///   "layers": [
///     { "layer_type": "dense", "n_out": 256 },
///     { "layer_type": "batchnorm" },
///     { "layer_type": "dropout", "drop_rate": 0.2 },
///     { "layer_type": "dense", "n_out": 10 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureConfig {
    /// Layout of the data entering the first layer. Optional in the file,
    /// required by the planner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<InputType>,
    /// Sequence of layer configurations defining the network structure.
    pub layers: Vec<LayerConfig>,
}

/// Loads an architecture configuration from a JSON file.
///
/// Reads the file at `path` and deserializes its JSON contents. No shape
/// validation happens here; problems surface when the architecture is
/// planned.
///
/// # Examples
///
/// ```no_run
/// use layernet::architecture::load_architecture;
///
/// let arch = load_architecture("config/mlp.json").unwrap();
/// assert!(!arch.layers.is_empty());
/// ```
pub fn load_architecture<P: AsRef<Path>>(path: P) -> Result<ArchitectureConfig, NetworkError> {
    let contents = fs::read_to_string(path)?;
    let config: ArchitectureConfig = serde_json::from_str(&contents)?;
    Ok(config)
}

/// Saves an architecture configuration to a JSON file.
pub fn save_architecture<P: AsRef<Path>>(
    config: &ArchitectureConfig,
    path: P,
) -> Result<(), NetworkError> {
    let contents = serde_json::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Shapes and parameter layout computed for an architecture before any
/// allocation happens.
///
/// All vectors are indexed by layer position. Spans are contiguous and
/// disjoint by construction; their concatenation covers exactly
/// `[0, total_params)`.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkPlan {
    /// Effective input to each layer, after any preprocessor.
    pub inputs: Vec<InputType>,
    /// Output of each layer.
    pub outputs: Vec<InputType>,
    /// Adapter applied in front of each layer, if any.
    pub preprocessors: Vec<Option<InputPreProcessor>>,
    /// Region of the parameter buffer owned by each layer.
    pub spans: Vec<ParamView>,
    /// Total length of the parameter buffer.
    pub total_params: usize,
    /// Output of the final layer.
    pub output: InputType,
}

/// Threads the declared input type through every layer of the architecture.
///
/// For each layer in order: selects the adapter the layer wants for the
/// current type, resolves the layer's input size from the adapted type,
/// cross-checks a hand-configured size against what actually arrives, and
/// advances to the layer's output type. Parameter spans are laid out
/// back-to-back in the same pass.
///
/// The configuration is mutated in place: unresolved `n_in`/`n_out` fields
/// are concrete once planning succeeds.
///
/// # Errors
///
/// [`ConfigurationError::EmptyArchitecture`] for an empty layer list,
/// [`ConfigurationError::MissingInputType`] when no input is declared, and
/// whatever shape errors the layers themselves raise.
pub fn plan_network(config: &mut ArchitectureConfig) -> Result<NetworkPlan, ConfigurationError> {
    if config.layers.is_empty() {
        return Err(ConfigurationError::EmptyArchitecture);
    }
    let declared = config.input.ok_or(ConfigurationError::MissingInputType)?;

    debug!(
        "planning network: {} layers, input {}",
        config.layers.len(),
        declared
    );

    let count = config.layers.len();
    let mut inputs = Vec::with_capacity(count);
    let mut outputs = Vec::with_capacity(count);
    let mut preprocessors = Vec::with_capacity(count);
    let mut spans = Vec::with_capacity(count);
    let mut current = declared;
    let mut offset = 0usize;

    for (i, layer) in config.layers.iter_mut().enumerate() {
        let preprocessor = layer.preprocessor_for(current);
        let effective = match preprocessor {
            Some(p) => p.output_type(current)?,
            None => current,
        };

        layer.set_n_in(effective, false)?;

        // A hand-configured size may disagree with what actually arrives
        let expected = layer.resolve_n_in(effective)?;
        if layer.base().n_in != expected {
            return Err(ConfigurationError::ShapeMismatch {
                component: layer.display_name().to_string(),
                expected,
                actual: layer.base().n_in,
            });
        }

        layer.validate()?;
        let out = layer.output_type(effective)?;

        let len = layer.param_len();
        let span = ParamView::new(offset, len);
        offset += len;

        trace!(
            "layer {} ({}): {} -> {}, {} params at [{}, {})",
            i,
            layer.display_name(),
            effective,
            out,
            len,
            span.offset,
            span.end()
        );

        inputs.push(effective);
        outputs.push(out);
        preprocessors.push(preprocessor);
        spans.push(span);
        current = out;
    }

    debug!("planned {} parameters, output {}", offset, current);

    Ok(NetworkPlan {
        inputs,
        outputs,
        preprocessors,
        spans,
        total_params: offset,
        output: current,
    })
}

/// Builds a network from an architecture configuration.
///
/// Plans the architecture, allocates the network-owned flat parameter buffer,
/// and instantiates every layer against its span with freshly initialized
/// values.
///
/// # Examples
///
/// ```
/// use layernet::architecture::{build_network, ArchitectureConfig};
/// use layernet::config::{DenseBuilder, NetworkContext};
/// use layernet::inputs::InputType;
///
/// let config = ArchitectureConfig {
///     input: Some(InputType::feed_forward(784)),
///     layers: vec![DenseBuilder::new().n_out(10).build().into()],
/// };
/// let network = build_network(config, &NetworkContext::new(42), &[]).unwrap();
/// assert_eq!(network.total_params(), 784 * 10 + 10);
/// ```
pub fn build_network(
    mut config: ArchitectureConfig,
    ctx: &NetworkContext,
    listeners: &[Arc<dyn TrainingListener>],
) -> Result<Network, NetworkError> {
    let plan = plan_network(&mut config)?;
    let mut params = vec![0.0f32; plan.total_params];
    let layers = instantiate_layers(&config, &plan, ctx, listeners, &mut params, true)?;

    debug!(
        "built network: {} layers, {} parameters",
        layers.len(),
        plan.total_params
    );

    Ok(Network {
        config,
        plan,
        params,
        layers,
    })
}

/// Rebuilds a network around a previously saved parameter buffer.
///
/// Plans the architecture exactly as [`build_network`] does, but adopts the
/// supplied buffer instead of initializing a fresh one. The buffer length
/// must equal the planned total.
pub fn restore_network(
    mut config: ArchitectureConfig,
    ctx: &NetworkContext,
    listeners: &[Arc<dyn TrainingListener>],
    params: Vec<f32>,
) -> Result<Network, NetworkError> {
    let plan = plan_network(&mut config)?;
    if params.len() != plan.total_params {
        return Err(NetworkError::ParameterSize(ParameterSizeError {
            layer: "network".to_string(),
            required: plan.total_params,
            actual: params.len(),
        }));
    }

    let mut params = params;
    let layers = instantiate_layers(&config, &plan, ctx, listeners, &mut params, false)?;

    debug!(
        "restored network: {} layers, {} parameters",
        layers.len(),
        plan.total_params
    );

    Ok(Network {
        config,
        plan,
        params,
        layers,
    })
}

fn instantiate_layers(
    config: &ArchitectureConfig,
    plan: &NetworkPlan,
    ctx: &NetworkContext,
    listeners: &[Arc<dyn TrainingListener>],
    params: &mut [f32],
    initialize: bool,
) -> Result<Vec<Box<dyn Layer>>, NetworkError> {
    let mut layers: Vec<Box<dyn Layer>> = Vec::with_capacity(config.layers.len());

    for (i, layer_config) in config.layers.iter().enumerate() {
        let view = plan.spans[i].slice_mut(params);
        let layer = layer_config.instantiate(ctx, listeners, i, view, initialize)?;
        layers.push(layer);
    }

    Ok(layers)
}

/// An assembled network: the resolved configuration, the flat parameter
/// buffer, and the instantiated layers aliasing into it by span.
pub struct Network {
    config: ArchitectureConfig,
    plan: NetworkPlan,
    params: Vec<f32>,
    layers: Vec<Box<dyn Layer>>,
}

impl Network {
    /// The architecture with every dimension resolved.
    pub fn config(&self) -> &ArchitectureConfig {
        &self.config
    }

    /// The planned shapes, adapters, and parameter spans.
    pub fn plan(&self) -> &NetworkPlan {
        &self.plan
    }

    /// The whole flat parameter buffer.
    pub fn params(&self) -> &[f32] {
        &self.params
    }

    /// Mutable access to the flat parameter buffer, for the execution engine.
    pub fn params_mut(&mut self) -> &mut [f32] {
        &mut self.params
    }

    /// The instantiated layers, in network order.
    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    /// The layer at `index`, if any.
    pub fn layer(&self, index: usize) -> Option<&dyn Layer> {
        self.layers.get(index).map(|l| l.as_ref())
    }

    /// The slice of the parameter buffer owned by the layer at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn layer_params(&self, index: usize) -> &[f32] {
        self.plan.spans[index].slice(&self.params)
    }

    /// Total length of the parameter buffer, trainable or not.
    pub fn total_params(&self) -> usize {
        self.params.len()
    }

    /// Number of trainable parameter values across all layers.
    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|l| l.parameter_count()).sum()
    }

    /// Layout of the final layer's output.
    pub fn output_type(&self) -> InputType {
        self.plan.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BatchNormBuilder, DenseBuilder, DropoutBuilder};

    fn mlp_config() -> ArchitectureConfig {
        ArchitectureConfig {
            input: Some(InputType::feed_forward(784)),
            layers: vec![
                DenseBuilder::new().n_out(256).build().into(),
                BatchNormBuilder::new().build().into(),
                DropoutBuilder::new().drop_rate(0.2).build().into(),
                DenseBuilder::new().n_out(10).build().into(),
            ],
        }
    }

    #[test]
    fn test_plan_empty_architecture() {
        let mut config = ArchitectureConfig {
            input: Some(InputType::feed_forward(784)),
            layers: vec![],
        };
        assert_eq!(
            plan_network(&mut config).unwrap_err(),
            ConfigurationError::EmptyArchitecture
        );
    }

    #[test]
    fn test_plan_missing_input_type() {
        let mut config = ArchitectureConfig {
            input: None,
            layers: vec![DenseBuilder::new().n_out(10).build().into()],
        };
        assert_eq!(
            plan_network(&mut config).unwrap_err(),
            ConfigurationError::MissingInputType
        );
    }

    #[test]
    fn test_plan_resolves_shapes_and_spans() {
        let mut config = mlp_config();
        let plan = plan_network(&mut config).unwrap();

        assert_eq!(plan.inputs[0], InputType::feed_forward(784));
        assert_eq!(plan.outputs[0], InputType::feed_forward(256));
        assert_eq!(plan.outputs[1], InputType::feed_forward(256));
        assert_eq!(plan.outputs[2], InputType::feed_forward(256));
        assert_eq!(plan.output, InputType::feed_forward(10));

        // Unresolved dimensions are concrete after planning
        assert_eq!(config.layers[1].base().n_in, 256);
        assert_eq!(config.layers[1].base().n_out, 256);
        assert_eq!(config.layers[3].base().n_in, 256);

        // Spans are laid out back-to-back
        let dense0 = 784 * 256 + 256;
        let norm = 4 * 256;
        assert_eq!(plan.spans[0], ParamView::new(0, dense0));
        assert_eq!(plan.spans[1], ParamView::new(dense0, norm));
        assert_eq!(plan.spans[2], ParamView::new(dense0 + norm, 0));
        assert_eq!(
            plan.spans[3],
            ParamView::new(dense0 + norm, 256 * 10 + 10)
        );
        assert_eq!(plan.total_params, dense0 + norm + 256 * 10 + 10);

        // No adapters needed anywhere in a pure feed-forward stack
        assert!(plan.preprocessors.iter().all(|p| p.is_none()));
    }

    #[test]
    fn test_plan_connection_mismatch() {
        let mut config = ArchitectureConfig {
            input: Some(InputType::feed_forward(784)),
            layers: vec![
                DenseBuilder::new().n_out(256).build().into(),
                // Hand-configured size that disagrees with the incoming 256
                BatchNormBuilder::new().n_in(100).n_out(100).build().into(),
            ],
        };

        let err = plan_network(&mut config).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::ShapeMismatch {
                component: "batchnorm".to_string(),
                expected: 256,
                actual: 100,
            }
        );
    }

    #[test]
    fn test_plan_requires_dense_n_out() {
        let mut config = ArchitectureConfig {
            input: Some(InputType::feed_forward(784)),
            layers: vec![DenseBuilder::new().build().into()],
        };

        let err = plan_network(&mut config).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::InvalidDimension {
                layer: "dense".to_string(),
                dim: "n_out",
            }
        );
    }

    #[test]
    fn test_plan_inserts_preprocessors() {
        let mut config = ArchitectureConfig {
            input: Some(InputType::convolutional_flat(28, 28, 1)),
            layers: vec![
                BatchNormBuilder::new().build().into(),
                DenseBuilder::new().n_out(10).build().into(),
            ],
        };
        let plan = plan_network(&mut config).unwrap();

        // Flattened input is reshaped back to spatial for the norm layer
        assert_eq!(
            plan.preprocessors[0],
            Some(InputPreProcessor::feed_forward_to_cnn(28, 28, 1))
        );
        assert_eq!(plan.inputs[0], InputType::convolutional(28, 28, 1));
        assert_eq!(config.layers[0].base().n_in, 1); // channel depth

        // The spatial output is flattened again for the dense layer
        assert_eq!(
            plan.preprocessors[1],
            Some(InputPreProcessor::cnn_to_feed_forward(28, 28, 1))
        );
        assert_eq!(plan.inputs[1], InputType::feed_forward(784));
        assert_eq!(config.layers[1].base().n_in, 784);
    }

    #[test]
    fn test_build_network() {
        let ctx = NetworkContext::new(42);
        let network = build_network(mlp_config(), &ctx, &[]).unwrap();

        assert_eq!(network.layers().len(), 4);
        assert_eq!(network.layer(0).unwrap().input_size(), 784);
        assert_eq!(network.layer(0).unwrap().output_size(), 256);
        assert_eq!(network.layer(1).unwrap().output_size(), 256);
        assert_eq!(network.layer(3).unwrap().output_size(), 10);
        assert_eq!(network.output_type(), InputType::feed_forward(10));

        let expected_total = (784 * 256 + 256) + 4 * 256 + (256 * 10 + 10);
        assert_eq!(network.total_params(), expected_total);

        // Dropout owns no parameters, batchnorm's running stats are frozen
        let expected_trainable = (784 * 256 + 256) + 2 * 256 + (256 * 10 + 10);
        assert_eq!(network.parameter_count(), expected_trainable);
    }

    #[test]
    fn test_restore_network_round_trip() {
        let ctx = NetworkContext::new(42);
        let built = build_network(mlp_config(), &ctx, &[]).unwrap();
        let saved = built.params().to_vec();

        let restored = restore_network(mlp_config(), &ctx, &[], saved.clone()).unwrap();
        assert_eq!(restored.params(), saved.as_slice());
    }

    #[test]
    fn test_restore_network_wrong_length() {
        let ctx = NetworkContext::new(42);
        let result = restore_network(mlp_config(), &ctx, &[], vec![0.0; 3]);

        match result {
            Err(NetworkError::ParameterSize(err)) => {
                assert_eq!(err.actual, 3);
                assert!(err.required > 0);
            }
            _ => panic!("expected a parameter size error"),
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mlp.json");

        let config = mlp_config();
        save_architecture(&config, &path).unwrap();
        let loaded = load_architecture(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_architecture_from_json() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let json_content = r#"{
  "input": { "kind": "feed_forward", "size": 784 },
  "layers": [
    { "layer_type": "dense", "n_out": 256 },
    { "layer_type": "batchnorm", "eps": 1e-5, "decay": 0.9 },
    { "layer_type": "dense", "n_out": 10 }
  ]
}"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();

        let config = load_architecture(temp_file.path()).unwrap();
        assert_eq!(config.input, Some(InputType::feed_forward(784)));
        assert_eq!(config.layers.len(), 3);
        assert_eq!(config.layers[0].base().n_out, 256);
        assert_eq!(config.layers[1].display_name(), "batchnorm");

        // Unresolved until planned
        assert_eq!(config.layers[0].base().n_in, 0);
    }

    #[test]
    fn test_load_architecture_rejects_unknown_layer_type() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let json_content = r#"{
  "input": { "kind": "feed_forward", "size": 784 },
  "layers": [ { "layer_type": "conv3d" } ]
}"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();

        let result = load_architecture(temp_file.path());
        assert!(matches!(result, Err(NetworkError::Json(_))));
    }
}

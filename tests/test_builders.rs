// Integration tests for layer configuration builders and serialization.
// Tests builder defaults, fluent overrides, deep cloning, and the JSON
// representation of every configuration variant.

use layernet::config::{
    BatchNormBuilder, BatchNormConfig, DenseBuilder, DropoutBuilder, LayerConfig,
};
use layernet::inputs::InputType;

// ============================================================================
// Builder Default Tests
// ============================================================================

#[test]
fn test_batchnorm_builder_defaults() {
    let conf = BatchNormBuilder::new().build();

    assert_eq!(conf.decay, 0.9);
    assert_eq!(conf.eps, 1e-5);
    assert_eq!(conf.gamma, 1.0);
    assert_eq!(conf.beta, 0.0);
    assert!(!conf.lock_gamma_beta);
    assert!(conf.use_batch_mean);
    assert_eq!(conf.base.n_in, 0); // unresolved until planned
    assert_eq!(conf.base.n_out, 0);
}

#[test]
fn test_dropout_builder_defaults() {
    let conf = DropoutBuilder::new().build();
    assert_eq!(conf.drop_rate, 0.5);
}

#[test]
fn test_dense_builder_defaults() {
    let conf = DenseBuilder::new().build();
    assert_eq!(conf.base.n_in, 0);
    assert_eq!(conf.base.n_out, 0);
    assert!(conf.base.name.is_none());
}

// ============================================================================
// Fluent Override Tests
// ============================================================================

#[test]
fn test_batchnorm_overrides_survive_build() {
    // Overridden fields come back exactly, untouched fields keep defaults
    let conf = BatchNormBuilder::new()
        .gamma(2.0)
        .beta(0.5)
        .lock_gamma_beta(true)
        .build();

    assert_eq!(conf.gamma, 2.0);
    assert_eq!(conf.beta, 0.5);
    assert!(conf.lock_gamma_beta);
    assert_eq!(conf.decay, 0.9);
    assert_eq!(conf.eps, 1e-5);
    assert!(conf.use_batch_mean);
}

#[test]
fn test_batchnorm_partial_constructors() {
    let conf = BatchNormBuilder::with_gamma_beta(2.0, 0.5).build();
    assert_eq!(conf.gamma, 2.0);
    assert_eq!(conf.beta, 0.5);
    assert_eq!(conf.decay, 0.9);

    let conf = BatchNormBuilder::with_decay(0.99, false).build();
    assert_eq!(conf.decay, 0.99);
    assert!(!conf.use_batch_mean);
    assert_eq!(conf.gamma, 1.0);
}

#[test]
fn test_builders_never_validate() {
    // Out-of-range and degenerate values are stored as given; problems
    // surface at planning and instantiation time, not construction time
    let conf = BatchNormBuilder::new().eps(0.0).decay(7.5).build();
    assert_eq!(conf.eps, 0.0);
    assert_eq!(conf.decay, 7.5);

    let conf = DropoutBuilder::new().drop_rate(1.5).build();
    assert_eq!(conf.drop_rate, 1.5);
}

#[test]
fn test_builder_names_flow_into_errors() {
    let conf = BatchNormBuilder::new().name("norm_head").build();
    let err = conf.validate().unwrap_err();
    assert!(err.to_string().contains("norm_head"));
}

// ============================================================================
// Clone Independence Tests
// ============================================================================

#[test]
fn test_clone_then_mutate_leaves_original_untouched() {
    let original: LayerConfig = BatchNormBuilder::new()
        .name("norm0")
        .n_in(8)
        .n_out(8)
        .gamma(2.0)
        .build()
        .into();

    let mut copy = original.clone();
    copy.set_n_in(InputType::feed_forward(32), true).unwrap();
    if let LayerConfig::BatchNorm(c) = &mut copy {
        c.gamma = -1.0;
        c.base.name = Some("mutated".to_string());
    }

    assert_eq!(original.base().n_in, 8);
    assert_eq!(original.display_name(), "norm0");
    if let LayerConfig::BatchNorm(c) = &original {
        assert_eq!(c.gamma, 2.0);
    }
    assert_eq!(copy.base().n_in, 32);
    assert_eq!(copy.display_name(), "mutated");
}

// ============================================================================
// Serialization Tests
// ============================================================================

#[test]
fn test_every_variant_round_trips_through_json() {
    let configs: Vec<LayerConfig> = vec![
        BatchNormBuilder::new()
            .n_in(8)
            .n_out(8)
            .gamma(2.0)
            .lock_gamma_beta(true)
            .build()
            .into(),
        DenseBuilder::new().name("head").n_in(8).n_out(4).build().into(),
        DropoutBuilder::new().drop_rate(0.2).build().into(),
    ];

    for conf in configs {
        let json = serde_json::to_string(&conf).unwrap();
        let parsed: LayerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, conf, "round trip changed {}", json);
    }
}

#[test]
fn test_json_uses_layer_type_discriminator() {
    let conf: LayerConfig = DenseBuilder::new().n_in(8).n_out(4).build().into();
    let json = serde_json::to_string(&conf).unwrap();

    assert!(json.contains("\"layer_type\":\"dense\""));
    assert!(json.contains("\"n_in\":8"));
    assert!(json.contains("\"n_out\":4"));
}

#[test]
fn test_unset_name_is_omitted_from_json() {
    let conf: LayerConfig = DropoutBuilder::new().build().into();
    let json = serde_json::to_string(&conf).unwrap();
    assert!(!json.contains("\"name\""));

    let conf: LayerConfig = DropoutBuilder::new().name("drop0").build().into();
    let json = serde_json::to_string(&conf).unwrap();
    assert!(json.contains("\"name\":\"drop0\""));
}

#[test]
fn test_missing_json_fields_fall_back_to_builder_defaults() {
    let parsed: BatchNormConfig = serde_json::from_str(r#"{"n_in": 8, "n_out": 8}"#).unwrap();
    let built = BatchNormBuilder::new().n_in(8).n_out(8).build();
    assert_eq!(parsed, built);
}

#[test]
fn test_unknown_layer_type_is_rejected() {
    let json = r#"{"layer_type": "conv3d", "n_in": 8, "n_out": 8}"#;
    let result: Result<LayerConfig, _> = serde_json::from_str(json);
    assert!(result.is_err());
}

#[test]
fn test_legacy_batchnorm_json_still_parses() {
    // Older configurations only carried decay and the statistics mode
    let json = r#"{"layer_type": "batchnorm", "decay": 0.99, "use_batch_mean": false}"#;
    let parsed: LayerConfig = serde_json::from_str(json).unwrap();

    assert_eq!(
        parsed,
        LayerConfig::BatchNorm(BatchNormBuilder::with_decay(0.99, false).build())
    );
}

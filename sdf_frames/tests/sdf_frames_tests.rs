use approx::assert_relative_eq;
use nalgebra::Vector3;
use sdf_frames::{
    pose_from_translation, pose_from_xyz_rpy, poses_equal, Element, ErrorCode, ErrorsExt,
    GraphOwner, ParserConfig, Resolver,
};
use std::f64::consts::FRAC_PI_2;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn load(name: &str) -> Element {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/test_worlds")
        .join(name);
    let result = Element::load_file(&path);
    assert!(result.is_ok(), "Failed to load {}: {:?}", name, result.err());
    result.unwrap()
}

fn build(name: &str, config: ParserConfig) -> (Resolver, GraphOwner) {
    let resolver = Resolver::new(config);
    let (owner, errors) = resolver.build_graphs(&load(name));
    assert!(errors.is_empty(), "{} has errors: {:?}", name, errors);
    (resolver, owner)
}

fn translation(resolver: &Resolver, owner: &GraphOwner, source: &str, target: &str) -> Vector3<f64> {
    let (pose, errors) = resolver.resolve_pose(owner.handle(), source, target);
    assert!(errors.is_empty(), "{} in {}: {:?}", source, target, errors);
    pose.translation.vector
}

#[test]
fn test_joint_parent_frame_in_child_frame() {
    let (resolver, owner) = build("joint_parent_frame.sdf", ParserConfig::strict());

    assert_relative_eq!(
        translation(&resolver, &owner, "joint", "__model__"),
        Vector3::new(0.0, 1.0, 10.0)
    );
    assert_relative_eq!(
        translation(&resolver, &owner, "joint", "parent_link"),
        Vector3::new(0.0, 1.0, 9.0)
    );
    assert_relative_eq!(
        translation(&resolver, &owner, "parent_frame", "__model__"),
        Vector3::new(1.0, 0.0, 1.0)
    );

    let (parent, errors) = resolver.resolve_parent_link(owner.handle(), "joint");
    assert!(errors.is_empty());
    assert_eq!(parent, "parent_link");
    assert_eq!(resolver.resolve_child_link(owner.handle(), "joint").0, "child_link");
    assert_eq!(resolver.resolve_attached_to(owner.handle(), "joint").0, "child_link");
}

#[test]
fn test_joint_parent_frame_in_scope_root() {
    let (resolver, owner) = build("joint_parent_frame.sdf", ParserConfig::default());
    assert_relative_eq!(
        translation(&resolver, &owner, "joint", "__model__"),
        Vector3::new(0.0, 1.0, 0.0)
    );
}

#[test]
fn test_collision_pose() {
    let (resolver, owner) = build("joint_parent_frame.sdf", ParserConfig::default());
    let (pose, errors) =
        resolver.resolve_child_pose(owner.handle(), "child_link", "body", "parent_link");
    assert!(errors.is_empty(), "{:?}", errors);
    assert_relative_eq!(pose.translation.vector, Vector3::new(0.0, 0.0, 8.5));
}

#[test]
fn test_world_joint_child_frame() {
    let (resolver, owner) = build("world_joint_child_frame.sdf", ParserConfig::strict());

    assert_relative_eq!(
        translation(&resolver, &owner, "J1", "world"),
        Vector3::new(1.0, 1.0, 10.0)
    );
    assert_relative_eq!(
        translation(&resolver, &owner, "J2", "world"),
        Vector3::new(10.0, 0.0, 10.0)
    );
    assert_relative_eq!(
        translation(&resolver, &owner, "child_frame", "world"),
        Vector3::new(0.0, 1.0, 10.0)
    );
    assert_relative_eq!(
        translation(&resolver, &owner, "child_model::L", "parent_model::L"),
        Vector3::new(0.0, 0.0, 9.0)
    );

    let handle = owner.handle();
    assert_eq!(resolver.resolve_parent_link(handle, "J1").0, "parent_model::L");
    assert_eq!(resolver.resolve_child_link(handle, "J1").0, "child_model::L");
    assert_eq!(resolver.resolve_attached_to(handle, "child_frame").0, "child_model::L");
    assert_eq!(resolver.resolve_attached_to(handle, "J2").0, "child_model::L");
}

#[test]
fn test_nested_model_poses() {
    let (resolver, owner) = build("nested_models.sdf", ParserConfig::default());
    let placement = pose_from_xyz_rpy(1.0, 2.0, 3.0, 0.0, 0.0, FRAC_PI_2);

    let (link, errors) = resolver.resolve_pose(owner.handle(), "M::L", "world");
    assert!(errors.is_empty());
    let expected = placement * pose_from_translation(1.0, 0.0, 0.0);
    assert!(poses_equal(&link, &expected, 1e-9));
    assert_relative_eq!(link.translation.vector, Vector3::new(1.0, 3.0, 3.0), epsilon = 1e-9);

    assert_relative_eq!(
        translation(&resolver, &owner, "M::inner::sensor_link", "world"),
        Vector3::new(1.0, 3.0, 4.0),
        epsilon = 1e-9
    );
    assert_relative_eq!(
        translation(&resolver, &owner, "M::sensor", "world"),
        Vector3::new(1.0, 3.0, 4.1),
        epsilon = 1e-9
    );
    assert_relative_eq!(
        translation(&resolver, &owner, "mount", "world"),
        Vector3::new(1.0, 3.0, 3.5),
        epsilon = 1e-9
    );
    assert_relative_eq!(
        translation(&resolver, &owner, "scenery::marker", "ground"),
        Vector3::new(5.0, 0.0, 2.0)
    );

    let (visual, errors) = resolver.resolve_child_pose(owner.handle(), "M::L", "shell", "world");
    assert!(errors.is_empty());
    assert_relative_eq!(visual.translation.vector, Vector3::new(1.0, 3.0, 3.25), epsilon = 1e-9);
}

#[test]
fn test_nested_model_attachment() {
    let (resolver, owner) = build("nested_models.sdf", ParserConfig::default());
    let handle = owner.handle();

    assert_eq!(resolver.resolve_attached_to(handle, "M").0, "M::L");
    assert_eq!(resolver.resolve_attached_to(handle, "M::sensor").0, "M::inner::sensor_link");
    assert_eq!(resolver.resolve_attached_to(handle, "mount").0, "M::L");
    // a model without links stays attached to itself
    assert_eq!(resolver.resolve_attached_to(handle, "scenery::marker").0, "scenery");
    assert_eq!(resolver.resolve_attached_to(handle, "ground").0, "ground");
}

#[test]
fn test_nested_frame_chain_crosses_placeholders() {
    let (resolver, owner) = build("nested_models.sdf", ParserConfig::default());
    let (chain, errors) = resolver.frame_chain(owner.handle(), "M::inner::sensor_link", "ground");
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(
        chain,
        vec!["M::inner::sensor_link", "M::inner", "M::L", "M", "world", "ground"]
    );
}

#[test]
fn test_scoped_references_can_be_disabled() {
    let config = ParserConfig {
        allow_scoped_references: false,
        ..ParserConfig::default()
    };
    let resolver = Resolver::new(config);
    let (_owner, errors) = resolver.build_graphs(&load("nested_models.sdf"));

    // M::sensor and mount both use scoped names
    assert_eq!(errors.count_code(ErrorCode::PoseRelativeToInvalid), 2, "{:?}", errors);
    assert_eq!(errors.count_code(ErrorCode::FrameAttachedToInvalid), 1);
}

#[test]
fn test_relative_to_cycle_keeps_remainder() {
    init_tracing();
    let resolver = Resolver::new(ParserConfig::verbose());
    let (owner, errors) = resolver.build_graphs(&load("relative_to_cycle.sdf"));
    assert_eq!(errors.len(), 1, "{:?}", errors);
    assert!(errors.has_code(ErrorCode::PoseRelativeToCycle));

    assert_relative_eq!(
        translation(&resolver, &owner, "arm", "base"),
        Vector3::new(1.0, 0.0, 0.0)
    );
    let (_, errors) = resolver.resolve_pose(owner.handle(), "A", "base");
    assert!(errors.has_code(ErrorCode::PoseRelativeToCycle));

    let errors = resolver.validate(owner.handle());
    assert_eq!(errors.count_code(ErrorCode::PoseRelativeToCycle), 1);
}

#[test]
fn test_duplicate_names() {
    let resolver = Resolver::default();
    let (owner, errors) = resolver.build_graphs(&load("duplicate_names.sdf"));
    assert_eq!(errors.len(), 1, "{:?}", errors);
    assert_eq!(errors[0].code, ErrorCode::DuplicateName);
    assert!(errors[0].message.contains("wheel"));

    // the first declaration keeps the name
    assert_eq!(resolver.resolve_attached_to(owner.handle(), "wheel").0, "wheel");
    assert_eq!(resolver.resolve_child_link(owner.handle(), "axle").0, "wheel");
}

#[test]
fn test_arm_world() {
    let (resolver, owner) = build("arm_world.sdf", ParserConfig::default());

    let (pose, errors) = resolver.resolve_pose(owner.handle(), "arm", "world");
    assert!(errors.is_empty());
    assert_relative_eq!(pose.translation.vector, Vector3::new(1.0, 0.0, 0.0));
    assert_relative_eq!(pose.rotation.angle(), 0.0);

    assert_relative_eq!(
        translation(&resolver, &owner, "elbow_marker", "world"),
        Vector3::new(1.5, 0.0, 0.1)
    );
    assert_eq!(resolver.resolve_attached_to(owner.handle(), "elbow_marker").0, "arm");
    assert_eq!(resolver.resolve_parent_link(owner.handle(), "elbow").0, "base");
}

#[test]
fn test_config_from_toml() {
    init_tracing();
    let config = ParserConfig::from_toml_str(
        r#"
        joint_pose_default = "child_frame"
        frame_pose_default = "attached_to"
        log_defects = true
        "#,
    )
    .unwrap();
    let (resolver, owner) = build("joint_parent_frame.sdf", config);
    assert_relative_eq!(
        translation(&resolver, &owner, "joint", "__model__"),
        Vector3::new(0.0, 1.0, 10.0)
    );
}

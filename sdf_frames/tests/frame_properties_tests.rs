//! Properties that hold for every well-formed document

use approx::assert_relative_eq;
use nalgebra::Vector3;
use sdf_frames::{
    pose_from_xyz_rpy, poses_equal, Element, ErrorCode, ErrorsExt, FrameGraphs, GraphBuilder,
    ParserConfig, Pose, Resolver, SemanticPose,
};

const ROBOT_WORLD: &str = r#"
<sdf version="1.9">
  <world name="properties">
    <link name="base"><pose>0.3 -0.2 0.1 0 0 0.4</pose></link>
    <link name="arm"><pose relative_to="base">1 0 0 0.1 0.2 0.3</pose></link>
    <joint name="shoulder" type="revolute">
      <pose relative_to="arm">0 0.5 0 0 0 -0.7</pose>
      <parent>base</parent>
      <child>arm</child>
    </joint>
    <frame name="tip" attached_to="shoulder"><pose>0 0 0.25 0.5 0 0</pose></frame>
    <model name="rover">
      <pose relative_to="tip">2 0 0 0 0 1.2</pose>
      <link name="chassis"><pose>0 0 0.3 0 0.1 0</pose></link>
      <model name="mast">
        <pose relative_to="chassis">0 0 1 0 0 0</pose>
        <link name="camera"><pose>0.1 0 0 0 0.3 0</pose></link>
      </model>
    </model>
  </world>
</sdf>"#;

fn graphs() -> FrameGraphs {
    let element = Element::from_xml_str(ROBOT_WORLD).unwrap();
    let (graphs, errors) = GraphBuilder::new(&ParserConfig::default()).build(&element);
    assert!(errors.is_empty(), "{:?}", errors);
    graphs
}

#[test]
fn test_every_frame_resolves_to_itself_as_identity() {
    let graphs = graphs();
    for name in graphs.frame_names() {
        let pose = graphs.resolve_pose(name, name).unwrap();
        assert_eq!(pose, Pose::identity(), "{}", name);
    }
}

#[test]
fn test_forward_and_backward_compose_to_identity() {
    let graphs = graphs();
    let names = graphs.frame_names();
    for a in &names {
        for b in &names {
            let ab = graphs.resolve_pose(a, b).unwrap();
            let ba = graphs.resolve_pose(b, a).unwrap();
            assert!(
                poses_equal(&(ab * ba), &Pose::identity(), 1e-9),
                "{} <-> {}",
                a,
                b
            );
            assert!(poses_equal(&ab, &ba.inverse(), 1e-9), "{} <-> {}", a, b);
        }
    }
}

#[test]
fn test_chain_composition() {
    let graphs = graphs();
    let names = graphs.frame_names();
    for a in &names {
        for b in &names {
            for c in &names {
                let ac = graphs.resolve_pose(a, c).unwrap();
                let via_b = graphs.resolve_pose(b, c).unwrap() * graphs.resolve_pose(a, b).unwrap();
                assert!(poses_equal(&ac, &via_b, 1e-9), "{} -> {} -> {}", a, b, c);
            }
        }
    }
}

#[test]
fn test_attachment_always_ends_on_a_body() {
    let graphs = graphs();
    for name in graphs.frame_names() {
        let body = graphs.resolve_attached_to(name).unwrap();
        let id = graphs.find(&body).unwrap();
        assert!(
            graphs.arena().vertex(id).kind.is_canonical_terminal(),
            "{} resolved to {}",
            name,
            body
        );
    }
}

#[test]
fn test_frame_attached_to_joint_resolves_to_child_link() {
    let graphs = graphs();
    assert_eq!(graphs.resolve_attached_to("tip").unwrap(), "arm");
    assert_eq!(graphs.resolve_attached_to("rover").unwrap(), "rover::chassis");
    assert_eq!(graphs.resolve_attached_to("rover::mast").unwrap(), "rover::mast::camera");
}

#[test]
fn test_nested_pose_is_placement_then_local() {
    let xml = r#"
        <world name="w">
          <model name="M">
            <pose>1 -2 0.5 0.3 -0.2 1.1</pose>
            <link name="L"><pose>0.4 0.1 -1 0 0.6 0.2</pose></link>
          </model>
        </world>"#;
    let resolver = Resolver::default();
    let (owner, errors) = resolver.build_graphs(&Element::from_xml_str(xml).unwrap());
    assert!(errors.is_empty(), "{:?}", errors);

    let p = pose_from_xyz_rpy(1.0, -2.0, 0.5, 0.3, -0.2, 1.1);
    let q = pose_from_xyz_rpy(0.4, 0.1, -1.0, 0.0, 0.6, 0.2);
    let (pose, errors) = resolver.resolve_pose(owner.handle(), "M::L", "world");
    assert!(errors.is_empty());
    assert!(poses_equal(&pose, &(p * q), 1e-12));
}

#[test]
fn test_base_and_arm_example() {
    let xml = r#"
        <world name="w">
          <link name="base"><pose relative_to="world">0 0 0 0 0 0</pose></link>
          <link name="arm"><pose relative_to="base">1 0 0 0 0 0</pose></link>
        </world>"#;
    let resolver = Resolver::default();
    let (owner, _) = resolver.build_graphs(&Element::from_xml_str(xml).unwrap());
    let (pose, errors) = resolver.resolve_pose(owner.handle(), "arm", "world");
    assert!(errors.is_empty());
    assert_relative_eq!(pose.translation.vector, Vector3::new(1.0, 0.0, 0.0));
    assert_relative_eq!(pose.rotation.angle(), 0.0);
}

#[test]
fn test_grandparent_names_are_not_searched() {
    let xml = r#"
        <world name="w">
          <link name="ground"/>
          <model name="outer">
            <link name="hull"/>
            <model name="inner">
              <link name="probe"/>
              <frame name="f" attached_to="ground"/>
              <frame name="g"><pose relative_to="ground"/></frame>
            </model>
          </model>
        </world>"#;
    let resolver = Resolver::default();
    let (owner, errors) = resolver.build_graphs(&Element::from_xml_str(xml).unwrap());
    assert_eq!(errors.count_code(ErrorCode::PoseRelativeToInvalid), 2, "{:?}", errors);
    assert_eq!(errors.count_code(ErrorCode::FrameAttachedToInvalid), 1);

    // the rest of the world is still usable
    let (_, errors) = resolver.resolve_pose(owner.handle(), "outer::inner::probe", "ground");
    assert!(errors.is_empty(), "{:?}", errors);
    let (_, errors) = resolver.resolve_pose(owner.handle(), "outer::inner::g", "ground");
    assert!(errors.has_code(ErrorCode::PoseRelativeToInvalid));
    let (_, errors) = resolver.resolve_attached_to(owner.handle(), "outer::inner::f");
    assert!(errors.has_code(ErrorCode::FrameAttachedToInvalid));
}

#[test]
fn test_nested_model_attached_to_grandparent_frame() {
    let xml = r#"
        <world name="w">
          <link name="ground"/>
          <model name="outer">
            <link name="hull"/>
            <model name="inner" attached_to="ground">
              <link name="probe"/>
            </model>
          </model>
        </world>"#;
    let resolver = Resolver::default();
    let (owner, errors) = resolver.build_graphs(&Element::from_xml_str(xml).unwrap());
    assert!(errors.has_code(ErrorCode::PoseRelativeToInvalid), "{:?}", errors);
    assert!(errors.has_code(ErrorCode::FrameAttachedToInvalid));

    // placement still defaults to the parent model frame
    let (_, errors) = resolver.resolve_pose(owner.handle(), "outer::inner::probe", "ground");
    assert!(errors.is_empty(), "{:?}", errors);
}

#[test]
fn test_semantic_pose_follows_rebuild() {
    let resolver = Resolver::default();
    let v1 = Element::from_xml_str(r#"<world name="w"><link name="l"><pose>1 0 0 0 0 0</pose></link></world>"#).unwrap();
    let v2 = Element::from_xml_str(r#"<world name="w"><link name="l"><pose>2 0 0 0 0 0</pose></link></world>"#).unwrap();

    let (owner, _) = resolver.build_graphs(&v1);
    let pose = SemanticPose::new(
        Pose::identity(),
        "l",
        "",
        resolver.registry().clone(),
        owner.handle(),
    );
    assert_relative_eq!(pose.resolve("world").unwrap().translation.vector.x, 1.0);

    assert!(resolver.rebuild(owner.handle(), &v2).is_empty());
    assert_relative_eq!(pose.resolve("world").unwrap().translation.vector.x, 2.0);

    drop(owner);
    assert_eq!(
        pose.resolve("world").unwrap_err().code,
        ErrorCode::InvalidGraphReference
    );
}

#[test]
fn test_concurrent_queries() {
    let resolver = Resolver::default();
    let (owner, _) = resolver.build_graphs(&Element::from_xml_str(ROBOT_WORLD).unwrap());
    let handle = owner.handle();

    std::thread::scope(|s| {
        for _ in 0..4 {
            let resolver = &resolver;
            s.spawn(move || {
                for _ in 0..50 {
                    let (_, errors) = resolver.resolve_pose(handle, "rover::mast::camera", "base");
                    assert!(errors.is_empty());
                }
            });
        }
    });
}

//! Sessions that reference trajectory and layout files next to them.

use std::fs;
use tascar_core::DVec3;
use tascar_scene::{ReceiverKind, SceneError, Session};

const SESSION: &str = r#"
    [session]
    name = "files"

    [[scene]]
    name = "walk"

    [[scene.source]]
    name = "walker"
    csvfile = "walk.csv"
    loop = 4

    [[scene.receiver]]
    name = "ring"
    type = "vbap"
    layout = "layouts/ring.toml"
"#;

const RING: &str = r#"
    name = "ring4"
    [[speaker]]
    az = 45
    [[speaker]]
    az = 135
    [[speaker]]
    az = -135
    [[speaker]]
    az = -45
"#;

fn write_session(dir: &std::path::Path) -> std::path::PathBuf {
    fs::create_dir_all(dir.join("layouts")).expect("layout dir");
    fs::write(dir.join("layouts").join("ring.toml"), RING).expect("write layout");
    fs::write(dir.join("walk.csv"), "# t x y z\n0,0,0,0\n2;4;0;0\n").expect("write csv");
    let path = dir.join("session.toml");
    fs::write(&path, SESSION).expect("write session");
    path
}

#[test]
fn trajectory_and_layout_files_resolve_next_to_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = Session::load_file(write_session(dir.path())).expect("valid session");
    assert_eq!(session.base_dir, dir.path());
    let scene = session.scene("walk").expect("scene");

    let rec = &scene.receiver[0];
    assert_eq!(rec.kind, ReceiverKind::Vbap);
    assert_eq!(rec.channels(), 4);
    assert_eq!(scene.output_ports()[3], "ring.3");

    let mut walker = scene.source[0]
        .object
        .build_dynobject(&session.base_dir)
        .expect("trajectory");
    let p = walker.geometry_update(1.0).position;
    assert!((p - DVec3::new(2.0, 0.0, 0.0)).length() < 1e-9);
    let p = walker.geometry_update(5.0).position;
    assert!((p - DVec3::new(2.0, 0.0, 0.0)).length() < 1e-9);
}

#[test]
fn missing_trajectory_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_session(dir.path());
    fs::remove_file(dir.path().join("walk.csv")).expect("remove csv");
    let err = Session::load_file(&path).unwrap_err();
    assert!(matches!(err, SceneError::Io { .. }), "{err}");
}

#[test]
fn empty_layout_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_session(dir.path());
    fs::write(dir.path().join("layouts").join("ring.toml"), "name = \"none\"\n")
        .expect("write layout");
    let err = Session::load_file(&path).unwrap_err();
    assert!(matches!(err, SceneError::Invalid(_)), "{err}");
}

#[test]
fn saved_session_reloads_with_the_same_scene() {
    let dir = tempfile::tempdir().expect("tempdir");
    let session = Session::load_file(write_session(dir.path())).expect("valid session");
    let copy = dir.path().join("copy.toml");
    fs::write(&copy, session.to_toml().expect("serialize")).expect("write copy");
    let again = Session::load_file(&copy).expect("reload");
    assert_eq!(again.scene, session.scene);
}

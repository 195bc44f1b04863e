//! Integration tests for sessions, the runner and scene synchronization

#![allow(clippy::unwrap_used, clippy::expect_used)]

use parking_lot::Mutex;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use voxdraw_core::{CompileError, DrawValue, EvalError, Interpreter, MeshBuffer};
use voxdraw_engine::{
    Material, MemoryScene, MeshId, RowProgress, RunError, RunPhase, SceneBackend, SceneEvent,
    Session, Settings,
};

/// Interpreter backed by a closure, ignoring the source text
struct FnInterpreter<F> {
    draw: F,
    compile_error: Option<CompileError>,
}

fn interp<F>(draw: F) -> FnInterpreter<F>
where
    F: Fn(usize, usize, usize, usize) -> Result<DrawValue, EvalError>,
{
    FnInterpreter {
        draw,
        compile_error: None,
    }
}

impl<F> Interpreter for FnInterpreter<F>
where
    F: Fn(usize, usize, usize, usize) -> Result<DrawValue, EvalError>,
{
    type Program = ();

    fn compile(&self, _source: &str) -> Result<(), CompileError> {
        match &self.compile_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn draw(
        &self,
        _program: &(),
        x: usize,
        y: usize,
        z: usize,
        grid_size: usize,
    ) -> Result<DrawValue, EvalError> {
        (self.draw)(x, y, z, grid_size)
    }
}

fn all_true(_: usize, _: usize, _: usize, _: usize) -> Result<DrawValue, EvalError> {
    Ok(DrawValue::Bool(true))
}

fn settings(grid_size: usize) -> Settings {
    Settings {
        grid_size,
        ..Settings::default()
    }
}

fn session<F>(draw: F, grid_size: usize) -> Session<FnInterpreter<F>, MemoryScene>
where
    F: Fn(usize, usize, usize, usize) -> Result<DrawValue, EvalError>,
{
    Session::new(interp(draw), MemoryScene::new(), settings(grid_size)).unwrap()
}

// ============================================================================
// Runner semantics
// ============================================================================

#[test]
fn all_true_cube_has_24_faces() {
    let session = session(all_true, 2);
    let report = session.run("").unwrap();

    assert_eq!(report.grid_size, 2);
    assert_eq!(report.occupied_cells, 8);
    assert_eq!(report.faces, 24);
    assert!(report.warnings.is_empty());

    let scene = session.scene().unwrap();
    let mesh = &scene.first_attached().unwrap().geometry;
    assert_eq!(mesh.vertex_count(), 96);
    assert_eq!(mesh.indices.len(), 144);
}

#[test]
fn draw_values_map_to_cells() {
    let session = session(
        |x, _, _, _| {
            Ok(match x {
                0 => DrawValue::Text("red".into()),
                1 => DrawValue::Bool(false),
                _ => DrawValue::Other,
            })
        },
        3,
    );
    let report = session.run("").unwrap();

    assert_eq!(report.occupied_cells, 9);
    let grid = session.grid().unwrap();
    assert_eq!(grid.get(0, 2, 1).and_then(|c| c.as_token()), Some("red"));
    assert!(!grid.is_occupied(1, 0, 0));
    assert!(!grid.is_occupied(2, 0, 0));
}

#[test]
fn failing_cell_becomes_warning() {
    let session = session(
        |x, y, z, _| {
            if (x, y, z) == (0, 0, 0) {
                Err(EvalError::new("boom", Some(2)))
            } else {
                Ok(DrawValue::Bool(true))
            }
        },
        2,
    );
    let report = session.run("").unwrap();

    assert_eq!(report.warnings.len(), 1);
    let warning = &report.warnings[0];
    assert_eq!((warning.x, warning.y, warning.z), (0, 0, 0));
    assert!(warning.message.contains("boom"));
    assert_eq!(report.occupied_cells, 7);
    assert!(!session.grid().unwrap().is_occupied(0, 0, 0));
}

#[test]
fn compile_failure_leaves_grid_empty_and_scene_untouched() {
    let session = session(all_true, 2);
    session.run("").unwrap();
    session.scene().unwrap().clear_events();

    let failing = Session::new(
        FnInterpreter {
            draw: all_true,
            compile_error: Some(CompileError::new("Unexpected token", Some(3))),
        },
        MemoryScene::new(),
        settings(2),
    )
    .unwrap();
    let err = failing.run("").unwrap_err();
    assert_eq!(err.kind(), "compile");
    assert!(matches!(err, RunError::Compile(ref e) if e.line == Some(3)));
    assert_eq!(failing.grid().unwrap().occupied_count(), 0);
    assert!(failing.scene().unwrap().events().is_empty());
    assert_eq!(failing.phase(), RunPhase::Idle);
}

#[test]
fn compile_failure_resets_previous_grid() {
    let fail = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&fail);

    struct Toggle(Arc<Mutex<bool>>);
    impl Interpreter for Toggle {
        type Program = ();
        fn compile(&self, _: &str) -> Result<(), CompileError> {
            if *self.0.lock() {
                Err(CompileError::new("bad", None))
            } else {
                Ok(())
            }
        }
        fn draw(
            &self,
            _: &(),
            _: usize,
            _: usize,
            _: usize,
            _: usize,
        ) -> Result<DrawValue, EvalError> {
            Ok(DrawValue::Bool(true))
        }
    }

    let session = Session::new(Toggle(flag), MemoryScene::new(), settings(2)).unwrap();
    session.run("").unwrap();
    assert_eq!(session.grid().unwrap().occupied_count(), 8);
    session.scene().unwrap().clear_events();

    *fail.lock() = true;
    assert!(session.run("").is_err());
    assert_eq!(session.grid().unwrap().occupied_count(), 0);
    // No scene update after a failed compile
    assert!(session.scene().unwrap().events().is_empty());
    assert_eq!(session.scene().unwrap().node_count(), 1);
}

#[test]
fn scene_updated_exactly_once_per_run() {
    let session = session(all_true, 3);
    session.run("").unwrap();
    session.scene().unwrap().clear_events();

    session.run("").unwrap();
    let scene = session.scene().unwrap();
    let created = scene
        .events()
        .iter()
        .filter(|e| matches!(e, SceneEvent::Created(_)))
        .count();
    assert_eq!(created, 1);
    assert_eq!(scene.node_count(), 1);
    assert_eq!(scene.live_meshes(), 1);
}

#[test]
fn empty_result_removes_mesh() {
    let on = Arc::new(Mutex::new(true));
    let flag = Arc::clone(&on);
    let session = session(move |_, _, _, _| Ok(DrawValue::Bool(*flag.lock())), 2);

    session.run("").unwrap();
    assert_eq!(session.scene().unwrap().node_count(), 1);

    *on.lock() = false;
    let report = session.run("").unwrap();
    assert_eq!(report.faces, 0);
    assert_eq!(session.scene().unwrap().node_count(), 0);
    assert_eq!(session.scene().unwrap().live_meshes(), 0);
}

#[test]
fn evaluation_order_is_y_z_x() {
    let seen = Mutex::new(Vec::new());
    let session = session(
        |x, y, z, _| {
            seen.lock().push((x, y, z));
            Ok(DrawValue::Other)
        },
        2,
    );
    session.run("").unwrap();
    drop(session);

    assert_eq!(
        seen.into_inner(),
        vec![
            (0, 0, 0),
            (1, 0, 0),
            (0, 0, 1),
            (1, 0, 1),
            (0, 1, 0),
            (1, 1, 0),
            (0, 1, 1),
            (1, 1, 1),
        ]
    );
}

// ============================================================================
// Checkpoints and re-entrancy
// ============================================================================

#[test]
fn checkpoint_called_once_per_row() {
    let session = session(all_true, 4);
    let mut seen = Vec::new();
    session
        .run_with("", &mut |p: RowProgress| seen.push(p.rows_done))
        .unwrap();

    assert_eq!(seen, (1..=16).collect::<Vec<_>>());
}

#[test]
fn checkpoint_interval_still_reports_last_row() {
    let session = Session::new(
        interp(all_true),
        MemoryScene::new(),
        Settings {
            grid_size: 3,
            yield_every_rows: 2,
            ..Settings::default()
        },
    )
    .unwrap();

    let mut seen = Vec::new();
    session
        .run_with("", &mut |p: RowProgress| {
            assert_eq!(p.rows_total, 9);
            seen.push(p.rows_done);
        })
        .unwrap();

    assert_eq!(seen, vec![2, 4, 6, 8, 9]);
}

#[test]
fn nested_run_is_busy() {
    let session = session(all_true, 2);
    let mut nested = Vec::new();

    session
        .run_with("", &mut |_: RowProgress| {
            assert_eq!(session.phase(), RunPhase::Evaluating);
            nested.push(session.run("").map(|_| ()).unwrap_err().kind());
            nested.push(session.resize(3).unwrap_err().kind());
        })
        .unwrap();

    assert!(nested.iter().all(|kind| *kind == "busy"));
    assert_eq!(nested.len(), 8);
    assert_eq!(session.phase(), RunPhase::Idle);
    assert_eq!(session.grid_size(), 2);
    assert_eq!(session.scene().unwrap().node_count(), 1);
}

#[test]
fn accessors_inside_checkpoint_report_busy() {
    let session = session(all_true, 3);
    let mut sizes = Vec::new();

    session
        .run_with("", &mut |_: RowProgress| {
            assert!(matches!(session.grid(), Err(RunError::Busy)));
            assert!(matches!(session.scene(), Err(RunError::Busy)));
            sizes.push(session.grid_size());
        })
        .unwrap();

    assert_eq!(sizes, vec![3; 9]);
    assert_eq!(session.grid().unwrap().occupied_count(), 27);
}

fn exploding_checkpoint(_: RowProgress) {
    panic!("checkpoint failed");
}

#[test]
fn phase_resets_after_panic() {
    let session = session(all_true, 2);

    let result = catch_unwind(AssertUnwindSafe(|| {
        session.run_with("", &mut exploding_checkpoint)
    }));
    assert!(result.is_err());
    assert_eq!(session.phase(), RunPhase::Idle);

    assert!(session.run("").is_ok());
}

// ============================================================================
// Resize, compile, shutdown
// ============================================================================

#[test]
fn resize_validates_and_clears() {
    let session = session(all_true, 2);
    session.run("").unwrap();

    let err = session.resize(0).unwrap_err();
    assert!(matches!(err, RunError::InvalidGridSize { size: 0, max: 128 }));
    assert_eq!(session.resize(129).unwrap_err().kind(), "invalid_grid_size");

    session.resize(5).unwrap();
    assert_eq!(session.grid_size(), 5);
    assert_eq!(session.settings().grid_size, 5);
    assert_eq!(session.grid().unwrap().occupied_count(), 0);

    let report = session.run("").unwrap();
    assert_eq!(report.occupied_cells, 125);
}

#[test]
fn invalid_settings_rejected() {
    let result = Session::new(interp(all_true), MemoryScene::new(), settings(0));
    assert!(result.is_err());
}

#[test]
fn compile_does_not_touch_grid() {
    let session = Session::headless(settings(2)).unwrap();
    session.run("fn draw(x, y, z, n) { true }").unwrap();

    assert!(session.compile("fn draw(x, y, z, n) { \"red\" }").is_ok());
    let err = session.compile("fn draw(x, y, z, n) {").unwrap_err();
    assert!(!err.message.is_empty());
    assert_eq!(session.grid().unwrap().occupied_count(), 8);
}

/// Scene backend whose state outlives the session
#[derive(Clone, Default)]
struct SharedScene(Arc<Mutex<MemoryScene>>);

impl SceneBackend for SharedScene {
    type Handle = MeshId;

    fn create_mesh(&mut self, geometry: MeshBuffer, material: Material) -> MeshId {
        self.0.lock().create_mesh(geometry, material)
    }

    fn add(&mut self, handle: &MeshId) {
        self.0.lock().add(handle);
    }

    fn remove(&mut self, handle: &MeshId) {
        self.0.lock().remove(handle);
    }

    fn release(&mut self, handle: MeshId) {
        self.0.lock().release(handle);
    }
}

#[test]
fn shutdown_releases_mesh() {
    let scene = SharedScene::default();
    let session = Session::new(interp(all_true), scene.clone(), settings(2)).unwrap();
    session.run("").unwrap();
    assert_eq!(scene.0.lock().live_meshes(), 1);

    session.shutdown();
    let inner = scene.0.lock();
    assert_eq!(inner.live_meshes(), 0);
    assert_eq!(inner.node_count(), 0);
}

#[test]
fn drop_releases_mesh() {
    let scene = SharedScene::default();
    {
        let session = Session::new(interp(all_true), scene.clone(), settings(3)).unwrap();
        session.run("").unwrap();
    }
    assert_eq!(scene.0.lock().live_meshes(), 0);
}

// ============================================================================
// End to end with the Rhai interpreter
// ============================================================================

#[test]
fn runaway_draw_becomes_warnings() {
    let session = Session::headless(Settings {
        grid_size: 2,
        max_operations_per_cell: 1_000,
        ..Settings::default()
    })
    .unwrap();

    let report = session
        .run("fn draw(x, y, z, n) { let i = 0; loop { i += 1; } }")
        .unwrap();
    assert_eq!(report.warnings.len(), 8);
    assert_eq!(report.faces, 0);
    assert_eq!(session.scene().unwrap().node_count(), 0);
}

#[test]
fn rhai_colors_reach_scene() {
    let session = Session::headless(settings(2)).unwrap();
    let report = session
        .run(
            r#"
            fn draw(x, y, z, n) {
                if y == 0 { "blue" } else { true }
            }
            "#,
        )
        .unwrap();
    assert_eq!(report.faces, 24);

    let scene = session.scene().unwrap();
    let mesh = &scene.first_attached().unwrap().geometry;
    let mut saw_blue = false;
    let mut saw_green = false;
    for i in 0..mesh.vertex_count() {
        let color = mesh.color(i).to_array();
        if color == [0.0, 0.0, 1.0] {
            saw_blue = true;
        } else if color == [0.0, 1.0, 0.0] {
            saw_green = true;
        } else {
            panic!("unexpected color {color:?}");
        }
    }
    assert!(saw_blue && saw_green);
}

#[test]
fn rhai_runtime_error_in_one_cell() {
    let session = Session::headless(settings(2)).unwrap();
    let report = session
        .run(
            r#"
            fn draw(x, y, z, n) {
                if x == 1 && y == 1 && z == 1 { throw "bad cell"; }
                "orange"
            }
            "#,
        )
        .unwrap();
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(
        (report.warnings[0].x, report.warnings[0].y, report.warnings[0].z),
        (1, 1, 1)
    );
    assert_eq!(report.occupied_cells, 7);
}

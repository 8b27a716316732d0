//! End-to-end dead code elimination through the library API

use yxir::middle::ir::{dump_modules, find_dangling_references, IrArena};
use yxir::middle::passes::dce::DcePass;
use yxir::shake_modules;
use yxir::util::config::{Backend, DceConfig};

use crate::fixtures::program;

fn config(backend: Backend) -> DceConfig {
    DceConfig {
        backend,
        ..DceConfig::default()
    }
}

#[test]
fn test_shake_program_js() {
    let mut p = program();
    let outcome = shake_modules(&mut p.arena, &config(Backend::Js)).unwrap();
    let removed = &outcome.report.removed;

    for name in [
        "runtime.stringGetLiteral",
        "runtime.getVirtualMethodId",
        "runtime.boxIntrinsic",
        "app.Circle.debug",
        "app.Square",
        "app.cache",
        "app.unused",
    ] {
        assert!(removed.contains(&name.to_string()), "{} should be removed", name);
    }
    assert_eq!(removed.len(), 7);

    assert!(p.arena.is_live(p.main));
    assert!(p.arena.is_live(p.api));
    assert!(p.arena.is_live(p.circle_area));
    assert!(!p.arena.is_live(p.square_area));
    assert!(!p.arena.is_live(p.unused));
    assert!(find_dangling_references(&p.arena).unwrap().is_empty());

    assert_eq!(outcome.stats.removed, 7);
    assert_eq!(outcome.roots, vec![p.api, p.main]);
}

#[test]
fn test_shake_program_wasm_keeps_string_support() {
    let mut p = program();
    let outcome = shake_modules(&mut p.arena, &config(Backend::Wasm)).unwrap();
    let removed = &outcome.report.removed;
    assert!(!removed.contains(&"runtime.stringGetLiteral".to_string()));
    assert!(removed.contains(&"runtime.getVirtualMethodId".to_string()));
    assert!(p.arena.is_live(p.circle_area));
    assert!(find_dangling_references(&p.arena).unwrap().is_empty());
}

#[test]
fn test_every_backend_is_sound() {
    for backend in [Backend::Js, Backend::Wasm, Backend::Native] {
        let mut p = program();
        shake_modules(&mut p.arena, &config(backend)).unwrap();
        assert!(
            find_dangling_references(&p.arena).unwrap().is_empty(),
            "dangling references after {} dce",
            backend
        );

        // 再跑一次不会再删东西
        let again = shake_modules(&mut p.arena, &config(backend)).unwrap();
        assert!(again.report.is_noop(), "{} dce is not idempotent", backend);
    }
}

#[test]
fn test_json_round_trip_preserves_result() {
    let p = program();
    let json = serde_json::to_string(&p.arena).unwrap();
    let mut restored: IrArena = serde_json::from_str(&json).unwrap();
    let mut original = p.arena;

    let a = shake_modules(&mut original, &DceConfig::default()).unwrap();
    let b = shake_modules(&mut restored, &DceConfig::default()).unwrap();
    assert_eq!(a.report.removed, b.report.removed);
    assert_eq!(dump_modules(&original).unwrap(), dump_modules(&restored).unwrap());
}

#[test]
fn test_dump_after_shake() {
    let mut p = program();
    let before = dump_modules(&p.arena).unwrap();
    assert!(before.contains("FUN name=unused"));

    shake_modules(&mut p.arena, &DceConfig::default()).unwrap();
    let after = dump_modules(&p.arena).unwrap();
    assert!(after.contains("MODULE_FRAGMENT name=app"));
    assert!(after.contains("FUN name=main"));
    assert!(after.contains("CLASS name=Circle"));
    assert!(!after.contains("FUN name=unused"));
    assert!(!after.contains("CLASS name=Square"));
}

#[test]
fn test_pass_reports_stats() {
    let mut p = program();
    let mut pass = DcePass::new(DceConfig::release());
    let outcome = pass.run(&mut p.arena).unwrap();
    let text = outcome.stats.format();
    assert!(text.contains("- Removed: 7"));
    assert!(outcome.useful.contains(p.main));
    assert!(outcome.useful.constructed_classes.len() >= 1);
}

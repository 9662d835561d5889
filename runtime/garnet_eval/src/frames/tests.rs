use super::*;
use garnet_patterns::EvalErrorKind;
use pretty_assertions::assert_eq;

fn registry() -> (FrameRegistry, StringInterner) {
    (FrameRegistry::new(None), StringInterner::new())
}

#[test]
fn push_links_parent_and_pop_ends_liveness() {
    let (mut frames, names) = registry();
    let m = frames.push(FrameKind::Method, false, names.intern("m")).unwrap();
    let b = frames.push(FrameKind::Block, true, names.intern("m")).unwrap();
    assert_eq!(frames.get(b).unwrap().parent, Some(m));
    assert_eq!(frames.current(), Some(b));
    assert!(frames.is_active(m) && frames.is_active(b));

    frames.pop(b);
    assert!(!frames.is_active(b));
    assert!(frames.is_active(m));
    frames.pop(m);
    assert!(frames.is_empty());
}

#[test]
fn relay_flag_is_read_back_while_the_frame_lives() {
    let (mut frames, names) = registry();
    let opaque = frames.push(FrameKind::Method, false, names.intern("m")).unwrap();
    let relaying = frames.push(FrameKind::Method, true, names.intern("each")).unwrap();
    assert!(!frames.relays_signals(opaque));
    assert!(frames.relays_signals(relaying));
    frames.pop(relaying);
    assert!(!frames.relays_signals(relaying));
}

#[test]
fn indices_are_never_reused() {
    let (mut frames, names) = registry();
    let first = frames.push(FrameKind::Method, false, names.intern("f")).unwrap();
    frames.pop(first);
    let second = frames.push(FrameKind::Method, false, names.intern("f")).unwrap();
    assert_ne!(first, second);
    assert!(!frames.is_active(first));
}

#[test]
fn foreign_chain_is_never_active() {
    let (mut a, names) = registry();
    let mut b = FrameRegistry::new(None);
    let in_a = a.push(FrameKind::Method, false, names.intern("main")).unwrap();
    let in_b = b.push(FrameKind::Method, false, names.intern("main")).unwrap();
    assert_eq!(in_a.index(), in_b.index());
    assert!(!b.is_active(in_a));
    assert!(!a.is_active(in_b));
}

#[test]
fn depth_limit_rejects_push() {
    let names = StringInterner::new();
    let mut frames = FrameRegistry::new(Some(2));
    let n = names.intern("deep");
    frames.push(FrameKind::Method, false, n).unwrap();
    frames.push(FrameKind::Method, false, n).unwrap();
    let err = frames.push(FrameKind::Method, false, n).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::StackOverflow { depth: 2 }));
    assert_eq!(frames.depth(), 2);
}

#[test]
fn ids_stay_ordered_past_the_u32_range() {
    let names = StringInterner::new();
    let mut frames = FrameRegistry {
        next_index: u64::from(u32::MAX),
        ..FrameRegistry::new(None)
    };
    let n = names.intern("long_running");
    let outer = frames.push(FrameKind::Method, false, n).unwrap();
    let inner = frames.push(FrameKind::Block, true, n).unwrap();
    assert!(outer.index() < inner.index());
    assert!(frames.is_active(outer) && frames.is_active(inner));
    assert_eq!(frames.get(inner).unwrap().parent, Some(outer));
}

#[test]
fn exhausted_indices_are_never_reissued() {
    let names = StringInterner::new();
    let mut frames = FrameRegistry {
        next_index: u64::MAX - 1,
        ..FrameRegistry::new(None)
    };
    let n = names.intern("last");
    let last = frames.push(FrameKind::Method, false, n).unwrap();
    let err = frames.push(FrameKind::Method, false, n).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::FrameIdsExhausted));
    assert_eq!(frames.depth(), 1);
    assert!(frames.is_active(last));

    frames.pop(last);
    assert!(frames.push(FrameKind::Method, false, n).is_err());
    assert!(frames.is_empty());
}

#[test]
fn capture_lists_innermost_first() {
    let (mut frames, names) = registry();
    let n = names.intern("each_pair");
    frames.push(FrameKind::Method, true, n).unwrap();
    frames.push(FrameKind::Block, true, n).unwrap();
    frames.push(FrameKind::Loop, true, n).unwrap();
    let trace = frames.capture(&names);
    let labels: Vec<&str> = trace.frames().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(labels, vec!["loop in each_pair", "block in each_pair", "each_pair"]);
}

#[test]
fn attach_backtrace_keeps_existing() {
    let (mut frames, names) = registry();
    frames.push(FrameKind::Method, false, names.intern("m")).unwrap();
    let err = frames.attach_backtrace(EvalError::new("boom"), &names);
    assert_eq!(err.backtrace.as_ref().map(EvalBacktrace::len), Some(1));
    frames.push(FrameKind::Block, true, names.intern("m")).unwrap();
    let err = frames.attach_backtrace(err, &names);
    assert_eq!(err.backtrace.as_ref().map(EvalBacktrace::len), Some(1));
}

proptest::proptest! {
    #[test]
    fn liveness_matches_the_stack(ops in proptest::collection::vec(proptest::bool::ANY, 0..64)) {
        let (mut frames, names) = registry();
        let name = names.intern("f");
        let mut live = Vec::new();
        let mut popped = Vec::new();
        for push in ops {
            if push || live.is_empty() {
                live.push(frames.push(FrameKind::Method, false, name).unwrap());
            } else if let Some(id) = live.pop() {
                frames.pop(id);
                popped.push(id);
            }
        }
        proptest::prop_assert_eq!(frames.depth(), live.len());
        proptest::prop_assert!(live.iter().all(|id| frames.is_active(*id)));
        proptest::prop_assert!(popped.iter().all(|id| !frames.is_active(*id)));
    }
}

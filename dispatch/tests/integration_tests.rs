use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use worldcmd_core::{
    Authorizer, BoundArgs, CommandBuilder, CommandError, CommandSpec, FnConverter, HandlerError,
    Locals, Parameter, ParameterHintSuggester, PermissionHook, is_permitted, types,
};
use worldcmd_dispatch::{Dispatcher, DispatcherConfig};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct Granted(Vec<String>);

struct GrantAuthorizer;

impl Authorizer for GrantAuthorizer {
    fn test_permission(&self, locals: &Locals, permission: &str) -> bool {
        locals
            .get::<Granted>()
            .is_some_and(|g| g.0.iter().any(|p| p == "*" || p == permission))
    }
}

fn counting(aliases: &[&'static str], counter: &Arc<AtomicUsize>) -> CommandSpec {
    let counter = Arc::clone(counter);
    CommandSpec::new(aliases.iter().copied(), move |_: &BoundArgs, _: &Locals| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// End-to-end dispatch
// ---------------------------------------------------------------------------

#[test]
fn test_sphere_scenario_through_dispatcher() {
    let dispatcher = Dispatcher::new(CommandBuilder::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    dispatcher
        .register(
            CommandSpec::new(["sphere", "s"], move |args: &BoundArgs, _: &Locals| {
                assert_eq!(args.str("block"), Some("stone"));
                assert_eq!(args.double("radius"), Some(2.0));
                assert!(args.flag("hollow"));
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .param(Parameter::positional("block", types::STRING))
            .param(Parameter::positional("radius", types::DOUBLE).default_value(["2"]))
            .param(Parameter::switch('h', "hollow")),
        )
        .unwrap();

    assert!(dispatcher.dispatch("s stone -h", &Locals::new()).unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_empty_input_is_not_handled() {
    let dispatcher = Dispatcher::new(CommandBuilder::new());
    let calls = Arc::new(AtomicUsize::new(0));
    dispatcher.register(counting(&["set"], &calls)).unwrap();

    assert!(!dispatcher.dispatch("", &Locals::new()).unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_permission_visibility_and_denial() {
    let authorizer = Arc::new(GrantAuthorizer);
    let mut builder = CommandBuilder::new();
    builder.add_hook(Arc::new(PermissionHook::new(authorizer.clone())));

    let calls = Arc::new(AtomicUsize::new(0));
    let visible_to = Arc::clone(&authorizer);

    // Hidden commands are "not handled" when only visible ones execute.
    let strict = Dispatcher::new(builder.clone()).with_visibility(move |command, _, locals| {
        Ok(is_permitted(visible_to.as_ref(), command, locals))
    });
    strict
        .register(counting(&["set"], &calls).permission("worldedit.region.set"))
        .unwrap();
    assert!(!strict.dispatch("set", &Locals::new()).unwrap());

    // With hidden commands executable, the permission hook rejects.
    let config = DispatcherConfig {
        execute_only_visible: false,
        ..DispatcherConfig::default()
    };
    let lenient = Dispatcher::with_config(builder, config);
    lenient
        .register(counting(&["set"], &calls).permission("worldedit.region.set"))
        .unwrap();
    let err = lenient.dispatch("set", &Locals::new()).unwrap_err();
    assert!(matches!(err, CommandError::PermissionDenied));

    let admin = Locals::new().with(Granted(vec!["*".into()]));
    assert!(lenient.dispatch("set", &admin).unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_handler_errors_are_converted() {
    let mut builder = CommandBuilder::new();
    builder.add_converter(FnConverter::new(["edit.radius"], |e| {
        format!("Radius too large: {}", e.message())
    }));
    let dispatcher = Dispatcher::new(builder);
    dispatcher
        .register(
            CommandSpec::new(["sphere"], |args: &BoundArgs, _: &Locals| {
                let radius = args.double("radius").unwrap_or_default();
                if radius > 50.0 {
                    return Err(HandlerError::new("edit.radius.max", format!("{radius}")));
                }
                Ok(())
            })
            .param(Parameter::positional("radius", types::DOUBLE)),
        )
        .unwrap();

    let err = dispatcher.dispatch("/sphere 60", &Locals::new()).unwrap_err();
    assert_eq!(err.to_string(), "Radius too large: 60");
    assert!(dispatcher.dispatch("/sphere 6", &Locals::new()).unwrap());
}

#[test]
fn test_global_unclaimed_flags_from_config() {
    let calls = Arc::new(AtomicUsize::new(0));
    let config = DispatcherConfig {
        allow_unclaimed_flags: true,
        ..DispatcherConfig::default()
    };
    let dispatcher = Dispatcher::with_config(CommandBuilder::new(), config);
    dispatcher.register(counting(&["set"], &calls)).unwrap();
    assert!(dispatcher.dispatch("set -q", &Locals::new()).unwrap());

    let strict = Dispatcher::new(CommandBuilder::new());
    strict.register(counting(&["set"], &calls)).unwrap();
    assert!(strict.dispatch("set -q", &Locals::new()).is_err());
}

// ---------------------------------------------------------------------------
// Configuration files
// ---------------------------------------------------------------------------

#[test]
fn test_config_file_controls_registration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("worldcmd.yml");
    std::fs::write(
        &path,
        "command_prefix: \"!\"\ndisabled_commands: [tree]\nalias_overrides:\n  sphere: [ball]\n",
    )
    .unwrap();

    let config = DispatcherConfig::load(&path).unwrap();
    let dispatcher = Dispatcher::with_config(CommandBuilder::new(), config);
    let calls = Arc::new(AtomicUsize::new(0));
    assert!(!dispatcher.register(counting(&["tree"], &calls)).unwrap());
    assert!(dispatcher.register(counting(&["sphere"], &calls)).unwrap());

    assert!(dispatcher.dispatch("!ball", &Locals::new()).unwrap());
    assert!(!dispatcher.dispatch("!tree", &Locals::new()).unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// Suggestions and help
// ---------------------------------------------------------------------------

#[test]
fn test_suggest_and_help_respect_visibility() {
    let dispatcher = Dispatcher::new(CommandBuilder::new())
        .with_default_suggester(Arc::new(ParameterHintSuggester))
        .with_visibility(|command, _, locals| {
            Ok(is_permitted(&GrantAuthorizer, command, locals))
        });
    let calls = Arc::new(AtomicUsize::new(0));
    dispatcher
        .register(
            counting(&["cyl"], &calls)
                .permission("worldedit.cyl")
                .param(Parameter::positional("radius", types::DOUBLE)),
        )
        .unwrap();
    dispatcher.register(counting(&["say"], &calls)).unwrap();

    let nobody = Locals::new();
    let proposals: Vec<String> = dispatcher
        .suggest("", &nobody)
        .iter()
        .map(|p| p.text().to_string())
        .collect();
    assert_eq!(proposals, ["say"]);
    assert_eq!(dispatcher.help(&nobody).len(), 1);

    let granted = Locals::new().with(Granted(vec!["worldedit.cyl".into()]));
    let hints = dispatcher.suggest("cyl ", &granted);
    assert_eq!(hints.len(), 1);
    assert!(hints[0].is_hint());
    assert_eq!(hints[0].text(), "<radius>");
    assert_eq!(dispatcher.help(&granted).len(), 2);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn test_concurrent_register_and_dispatch() {
    const PER_THREAD: usize = 200;

    let dispatcher = Arc::new(Dispatcher::new(CommandBuilder::new()));
    let calls = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = ["a", "b"]
        .into_iter()
        .map(|prefix| {
            let dispatcher = Arc::clone(&dispatcher);
            let calls = Arc::clone(&calls);
            thread::spawn(move || {
                let locals = Locals::new();
                for i in 0..PER_THREAD {
                    let alias = format!("{prefix}{i}");
                    let counter = Arc::clone(&calls);
                    dispatcher
                        .register(CommandSpec::new([alias.clone()], move |_, _| {
                            counter.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        }))
                        .unwrap();
                    assert!(dispatcher.dispatch(&alias, &locals).unwrap());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(dispatcher.len(), 2 * PER_THREAD);
    assert_eq!(calls.load(Ordering::SeqCst), 2 * PER_THREAD);
    for i in 0..PER_THREAD {
        assert!(dispatcher.contains(&format!("a{i}")));
        assert!(dispatcher.contains(&format!("b{i}")));
    }
}

//! Demo command set run by the `worldcmd` binary.
//!
//! Edits are recorded in an in-memory [`EditSession`] instead of touching a
//! world, and output goes to the issuing [`Actor`].

use std::sync::Arc;

use parking_lot::Mutex;
use worldcmd_core::{
    ArgumentCursor, Authorizer, Binder, BindingBehavior, BindingKey, BoundArgs, CallerName,
    CommandBuilder, CommandSpec, ConfigurationError, ConsumedCount, FnConverter, HandlerError,
    LegacyArgsHook, Locals, LocalsBinder, LoggingHook, Modifier, Parameter, ParameterError,
    ParameterHintSuggester, PermissionHook, TypeKey, Value, is_permitted, types,
};
use worldcmd_dispatch::{Dispatcher, DispatcherConfig};

pub const BLOCK: TypeKey = TypeKey::new("block");
pub const PATTERN: TypeKey = TypeKey::new("pattern");
pub const SESSION: TypeKey = TypeKey::new("session");

/// Largest radius any shape command accepts.
pub const MAX_RADIUS: f64 = 50.0;

/// Blocks in the selection that `set` fills.
const SELECTION_VOLUME: u64 = 1000;

const KNOWN_BLOCKS: &[&str] = &[
    "air",
    "bedrock",
    "cobblestone",
    "dirt",
    "glass",
    "grass",
    "gravel",
    "lava",
    "sand",
    "stone",
    "water",
    "wood",
];

// ---------------------------------------------------------------------------
// Actor and session
// ---------------------------------------------------------------------------

/// Whoever issued the command line.
#[derive(Debug)]
pub struct Actor {
    name: String,
    permissions: Vec<String>,
    messages: Mutex<Vec<String>>,
}

impl Actor {
    pub fn new(name: impl Into<String>, permissions: Vec<String>) -> Self {
        Self {
            name: name.into(),
            permissions,
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `*` grants everything.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == "*" || p == permission)
    }

    pub fn print(&self, message: impl Into<String>) {
        self.messages.lock().push(message.into());
    }

    /// Drains the messages printed so far.
    pub fn take_messages(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock())
    }
}

/// One recorded change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub description: String,
    pub blocks: u64,
}

/// Undo history of the edits made by one actor.
#[derive(Debug, Default)]
pub struct EditSession {
    history: Mutex<Vec<Edit>>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, description: impl Into<String>, blocks: u64) {
        self.history.lock().push(Edit {
            description: description.into(),
            blocks,
        });
    }

    /// Pops up to `times` edits, returning how many were undone.
    pub fn undo(&self, times: usize) -> usize {
        let mut history = self.history.lock();
        let count = times.min(history.len());
        let keep = history.len() - count;
        history.truncate(keep);
        count
    }

    #[cfg(test)]
    pub fn history(&self) -> Vec<Edit> {
        self.history.lock().clone()
    }
}

/// Builds the locals for one actor.
pub fn actor_locals(actor: Arc<Actor>, session: Arc<EditSession>) -> Locals {
    let caller = CallerName(actor.name().to_string());
    Locals::new().with(actor).with(session).with(caller)
}

/// Grants permissions according to the [`Actor`] in the locals.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActorAuthorizer;

impl Authorizer for ActorAuthorizer {
    fn test_permission(&self, locals: &Locals, permission: &str) -> bool {
        locals
            .get::<Arc<Actor>>()
            .is_some_and(|actor| actor.has_permission(permission))
    }
}

// ---------------------------------------------------------------------------
// Binders
// ---------------------------------------------------------------------------

fn parse_block(raw: &str) -> Result<String, ParameterError> {
    let lower = raw.to_lowercase();
    let name = lower.strip_prefix("minecraft:").unwrap_or(&lower);
    if KNOWN_BLOCKS.contains(&name) {
        Ok(name.to_string())
    } else {
        Err(ParameterError::invalid(format!("Block name '{raw}' was not recognized.")))
    }
}

fn complete_block(prefix: &str) -> Vec<String> {
    let prefix = prefix.to_lowercase();
    KNOWN_BLOCKS
        .iter()
        .filter(|block| block.starts_with(&prefix))
        .map(|block| block.to_string())
        .collect()
}

/// A single block type such as `stone`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockBinder;

impl Binder for BlockBinder {
    fn name(&self) -> &str {
        "block"
    }

    fn keys(&self) -> Vec<BindingKey> {
        vec![BLOCK.into()]
    }

    fn behavior(&self, _parameter: &Parameter) -> BindingBehavior {
        BindingBehavior::Consumes
    }

    fn consumed_count(&self, _parameter: &Parameter) -> ConsumedCount {
        ConsumedCount::Fixed(1)
    }

    fn bind(
        &self,
        _parameter: &Parameter,
        cursor: &mut ArgumentCursor<'_>,
    ) -> Result<Value, ParameterError> {
        parse_block(&cursor.next()?).map(Value::Text)
    }

    fn suggestions(&self, _parameter: &Parameter, prefix: &str) -> Vec<String> {
        complete_block(prefix)
    }
}

/// A comma-separated list of blocks such as `stone,dirt`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternBinder;

impl Binder for PatternBinder {
    fn name(&self) -> &str {
        "pattern"
    }

    fn keys(&self) -> Vec<BindingKey> {
        vec![PATTERN.into()]
    }

    fn behavior(&self, _parameter: &Parameter) -> BindingBehavior {
        BindingBehavior::Consumes
    }

    fn consumed_count(&self, _parameter: &Parameter) -> ConsumedCount {
        ConsumedCount::Fixed(1)
    }

    fn bind(
        &self,
        _parameter: &Parameter,
        cursor: &mut ArgumentCursor<'_>,
    ) -> Result<Value, ParameterError> {
        let raw = cursor.next()?;
        let blocks = raw
            .split(',')
            .map(|part| parse_block(part.trim()).map(Value::Text))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::List(blocks))
    }

    /// Completes the block after the last comma.
    fn suggestions(&self, _parameter: &Parameter, prefix: &str) -> Vec<String> {
        let (head, last) = match prefix.rsplit_once(',') {
            Some((head, last)) => (format!("{head},"), last),
            None => (String::new(), prefix),
        };
        complete_block(last)
            .into_iter()
            .map(|block| format!("{head}{block}"))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn actor(locals: &Locals) -> Result<&Arc<Actor>, HandlerError> {
    locals
        .get::<Arc<Actor>>()
        .ok_or_else(|| HandlerError::command("This command must be used by an actor."))
}

fn session(args: &BoundArgs) -> Result<&Arc<EditSession>, HandlerError> {
    args.custom::<Arc<EditSession>>(SESSION.as_str())
        .ok_or_else(|| HandlerError::command("No edit session is available."))
}

fn check_radius(radius: f64) -> Result<f64, HandlerError> {
    if radius > MAX_RADIUS {
        return Err(HandlerError::new("edit.radius.max", format!("{radius}")));
    }
    Ok(radius)
}

/// Lattice points within `radius` of the origin; only the outer shell when
/// `hollow`.
fn sphere_blocks(radius: f64, hollow: bool) -> u64 {
    let bound = radius.ceil() as i64;
    let outer = radius * radius;
    let inner = (radius - 1.0).max(0.0).powi(2);
    let mut count = 0;
    for x in -bound..=bound {
        for y in -bound..=bound {
            for z in -bound..=bound {
                let d = (x * x + y * y + z * z) as f64;
                if d <= outer && (!hollow || d > inner) {
                    count += 1;
                }
            }
        }
    }
    count
}

fn cylinder_blocks(radius: f64, height: u64, hollow: bool) -> u64 {
    let bound = radius.ceil() as i64;
    let outer = radius * radius;
    let inner = (radius - 1.0).max(0.0).powi(2);
    let mut disk = 0;
    for x in -bound..=bound {
        for z in -bound..=bound {
            let d = (x * x + z * z) as f64;
            if d <= outer && (!hollow || d > inner) {
                disk += 1;
            }
        }
    }
    disk * height
}

fn sphere(args: &BoundArgs, locals: &Locals) -> Result<(), HandlerError> {
    let block = args.str("block").unwrap_or("air");
    let radius = check_radius(args.double("radius").unwrap_or(2.0))?;
    let hollow = args.flag("hollow");

    let changed = sphere_blocks(radius, hollow);
    session(args)?.record(format!("sphere {block} {radius}"), changed);
    actor(locals)?.print(format!("{changed} blocks have been created."));
    Ok(())
}

fn cylinder(args: &BoundArgs, locals: &Locals) -> Result<(), HandlerError> {
    let block = args.str("block").unwrap_or("air");
    let radius = check_radius(args.double("radius").unwrap_or_default())?;
    let height = args.int("height").and_then(|h| u64::try_from(h).ok()).unwrap_or(1);
    let hollow = args.flag("hollow");

    let changed = cylinder_blocks(radius, height, hollow);
    session(args)?.record(format!("cyl {block} {radius} {height}"), changed);
    actor(locals)?.print(format!("{changed} blocks have been created."));
    Ok(())
}

fn set(args: &BoundArgs, locals: &Locals) -> Result<(), HandlerError> {
    let blocks: Vec<String> = args
        .get("pattern")
        .and_then(Value::as_list)
        .unwrap_or_default()
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();

    session(args)?.record(format!("set {}", blocks.join(",")), SELECTION_VOLUME);
    actor(locals)?.print(format!(
        "Operation completed ({SELECTION_VOLUME} blocks affected)."
    ));
    Ok(())
}

fn brush(args: &BoundArgs, locals: &Locals) -> Result<(), HandlerError> {
    let block = args.str("block").unwrap_or("air");
    let radius = check_radius(args.double("radius").unwrap_or(2.0))?;

    let actor = actor(locals)?;
    actor.print(format!("Sphere brush shape equipped ({radius}) with {block}."));
    if let Some(mask) = args.str("mask") {
        actor.print(format!("Brush mask set to {mask}."));
    }
    Ok(())
}

fn say(args: &BoundArgs, locals: &Locals) -> Result<(), HandlerError> {
    let message = args.str("message").unwrap_or_default();
    actor(locals)?.print(message);
    Ok(())
}

fn undo(args: &BoundArgs, locals: &Locals) -> Result<(), HandlerError> {
    let times = args
        .int("times")
        .and_then(|t| usize::try_from(t).ok())
        .unwrap_or(1);

    let undone = session(args)?.undo(times);
    if undone == 0 {
        return Err(HandlerError::new("edit.history.empty", "Nothing left to undo."));
    }
    actor(locals)?.print(format!("Undid {undone} available edits."));
    Ok(())
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Every demo command.
pub fn commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new(["sphere", "s"], sphere)
            .description("Generates a filled sphere.")
            .permission("worldedit.sphere")
            .param(Parameter::provided(SESSION))
            .param(Parameter::positional("block", BLOCK).describe("The block type"))
            .param(
                Parameter::positional("radius", types::DOUBLE)
                    .default_value(["2"])
                    .modifier(Modifier::at_least(0.0)),
            )
            .param(Parameter::switch('h', "hollow").describe("Make a hollow sphere")),
        CommandSpec::new(["cyl"], cylinder)
            .description("Generates a cylinder.")
            .permission("worldedit.cyl")
            .param(Parameter::provided(SESSION))
            .param(Parameter::positional("block", BLOCK))
            .param(Parameter::positional("radius", types::DOUBLE).modifier(Modifier::at_least(0.0)))
            .param(
                Parameter::positional("height", types::INT)
                    .default_value(["1"])
                    .modifier(Modifier::at_least(1.0)),
            )
            .param(Parameter::switch('h', "hollow").describe("Make a hollow cylinder")),
        CommandSpec::new(["set"], set)
            .description("Sets all the blocks in the region.")
            .permission("worldedit.set")
            .param(Parameter::provided(SESSION))
            .param(Parameter::positional("pattern", PATTERN).describe("The blocks to set")),
        CommandSpec::new(["brush", "br"], brush)
            .description("Choose the sphere brush.")
            .permission("worldedit.brush")
            .param(Parameter::positional("block", BLOCK))
            .param(Parameter::positional("radius", types::DOUBLE).default_value(["2"]))
            .param(Parameter::value_flag('f', "mask", types::STRING).describe("Source mask")),
        CommandSpec::new(["say"], say)
            .description("Echoes a message.")
            .permission("worldedit.say")
            .param(Parameter::positional("message", types::STRING).classifier(types::TEXT)),
        CommandSpec::new(["undo"], undo)
            .description("Undoes the last action.")
            .permission("worldedit.undo")
            .arg_limits(0, Some(1))
            .param(Parameter::provided(SESSION))
            .param(
                Parameter::positional("times", types::INT)
                    .default_value(["1"])
                    .modifier(Modifier::between(1.0, 100.0)),
            ),
    ]
}

/// Pipeline with the demo binders, hooks and converters installed.
pub fn command_builder() -> CommandBuilder {
    let authorizer: Arc<dyn Authorizer> = Arc::new(ActorAuthorizer);
    let mut builder = CommandBuilder::new();
    builder.binders_mut().register_binder(Arc::new(BlockBinder));
    builder.binders_mut().register_binder(Arc::new(PatternBinder));
    builder
        .binders_mut()
        .register_binder(Arc::new(LocalsBinder::<Arc<EditSession>>::new(SESSION)));
    builder
        .add_hook(Arc::new(PermissionHook::new(authorizer)))
        .add_hook(Arc::new(LegacyArgsHook))
        .add_hook(Arc::new(LoggingHook));
    builder
        .add_converter(FnConverter::new(["edit.radius"], |e: &HandlerError| {
            format!("Radius too large: {} (maximum is {MAX_RADIUS})", e.message())
        }))
        .add_converter(FnConverter::new(["edit.history"], |e: &HandlerError| {
            e.message().to_string()
        }));
    builder
}

/// Dispatcher with every demo command registered under `config`.
///
/// # Errors
///
/// The first [`ConfigurationError`] raised while registering.
pub fn dispatcher(config: DispatcherConfig) -> Result<Dispatcher, ConfigurationError> {
    let dispatcher = Dispatcher::with_config(command_builder(), config)
        .with_default_suggester(Arc::new(ParameterHintSuggester))
        .with_visibility(|command, _, locals| Ok(is_permitted(&ActorAuthorizer, command, locals)));
    for spec in commands() {
        dispatcher.register(spec)?;
    }
    Ok(dispatcher)
}

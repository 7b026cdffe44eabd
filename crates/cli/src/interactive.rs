use crate::output;
use address_gateway::LookupGateway;
use address_resolver::{
    AddressResolver, AnchorRect, DismissReason, ResolverConfig, ResolverOptions, WindowSize,
};
use anyhow::Result;
use log::{info, warn};
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, BufReader};

/// One line of stdin.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractiveInput {
    /// New field contents.
    Text(String),
    Select(usize),
    Escape,
    Blur,
    Down,
    Up,
    Enter,
    /// Value pushed by the surrounding form.
    External(String),
    /// Pointer press at window coordinates.
    Press { x: f64, y: f64 },
    Quit,
}

pub fn parse_line(line: &str) -> Result<InteractiveInput, String> {
    let Some(command) = line.strip_prefix(':') else {
        return Ok(InteractiveInput::Text(line.to_string()));
    };
    let (name, rest) = command.split_once(' ').unwrap_or((command, ""));
    match name {
        "esc" => Ok(InteractiveInput::Escape),
        "blur" => Ok(InteractiveInput::Blur),
        "down" => Ok(InteractiveInput::Down),
        "up" => Ok(InteractiveInput::Up),
        "enter" => Ok(InteractiveInput::Enter),
        "quit" | "q" => Ok(InteractiveInput::Quit),
        "set" => Ok(InteractiveInput::External(rest.to_string())),
        "click" => parse_press(rest),
        index => index
            .parse::<usize>()
            .map(InteractiveInput::Select)
            .map_err(|_| format!("unknown command :{name}")),
    }
}

fn parse_press(rest: &str) -> Result<InteractiveInput, String> {
    let coords = rest
        .split_whitespace()
        .map(str::parse::<f64>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| format!(":click expects X Y ({err})"))?;
    match coords.as_slice() {
        [x, y] => Ok(InteractiveInput::Press { x: *x, y: *y }),
        _ => Err(":click expects X Y".to_string()),
    }
}

pub struct InteractiveOptions {
    pub layout: Option<(AnchorRect, WindowSize)>,
    pub json: bool,
}

pub async fn run(
    gateway: LookupGateway,
    config: ResolverConfig,
    options: InteractiveOptions,
) -> Result<()> {
    let resolver = AddressResolver::start_with(
        gateway,
        config,
        ResolverOptions {
            on_change: Some(Arc::new(|value: &str| info!("field value: {value:?}"))),
            registry: None,
        },
    )?;
    if let Some((anchor, window)) = options.layout {
        resolver.set_layout(anchor, window).await?;
    }

    let mut updates = resolver.subscribe();
    let json = options.json;
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            if let Err(err) = output::print_snapshot(&snapshot, json) {
                warn!("Failed to print snapshot: {err}");
            }
        }
    });

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = match parse_line(&line) {
            Ok(input) => input,
            Err(err) => {
                warn!("{err}");
                continue;
            }
        };
        match input {
            InteractiveInput::Text(text) => resolver.keystroke(text).await?,
            InteractiveInput::Select(index) => report_selection(resolver.select(index).await),
            InteractiveInput::Enter => report_selection(resolver.select_highlighted().await),
            InteractiveInput::Escape => resolver.dismiss(DismissReason::Escape).await?,
            InteractiveInput::Blur => resolver.blur(false).await?,
            InteractiveInput::Down => resolver.highlight_next().await?,
            InteractiveInput::Up => resolver.highlight_previous().await?,
            InteractiveInput::External(value) => resolver.push_external_value(value).await?,
            InteractiveInput::Press { x, y } => resolver.pointer_down(x, y).await?,
            InteractiveInput::Quit => break,
        }
    }

    resolver.shutdown().await?;
    drop(resolver);
    printer.await?;
    Ok(())
}

fn report_selection(result: address_resolver::Result<String>) {
    match result {
        Ok(value) => info!("selected {value:?}"),
        Err(err) => warn!("{err}"),
    }
}

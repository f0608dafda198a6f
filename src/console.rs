//! Interactive G-code console
//!
//! Reads lines from stdin and drives a [`CommandStreamer`]. `go` sends the
//! queue, `list` shows it, `help` lists the builders. A line starting with
//! `'` or `"`, or one whose first word is not a known builder, is tokenized
//! as raw G-code; otherwise `<op> key=value...` dispatches to the matching
//! builder in `printkit_core::gcode::ops`.

use anyhow::Result;
use printkit_communication::CommandStreamer;
use printkit_core::gcode::ops::{self, Travel};
use printkit_core::{Command, GcodeError};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};

type CoreResult<T> = printkit_core::Result<T>;

const OPS_HELP: &[(&str, &str)] = &[
    ("set_toolidx", "toolidx=N - select the default print head"),
    ("set_lineno", "number=N - reset the firmware line counter"),
    ("set_hotendtemp", "celsius=T [toolidx=N] [max_autotemp=T]"),
    ("get_temp", "[toolidx=N] - request a temperatures report"),
    ("wait_hotendtemp", "celsius=T [toolidx=N] [heat_to] [max_autotemp=T]"),
    ("wait_bedtemp", "celsius=T [heat_to]"),
    ("set_bedtemp", "celsius=T"),
    ("set_extrudemode", "mode=absolute|relative"),
    ("set_units", "units=mm|in"),
    ("set_positioning", "mode=absolute|relative"),
    ("set_fanspeed", "speed=S [fanidx=N] [secondary=N]"),
    ("set_fanoff", "[fanidx=N]"),
    ("home_axis", "[x] [y] [z] [optional] - all axes when none given"),
    ("home_all_axis", "home every axis"),
    ("set_axis_steps", "[steps=E] [extruderidx=N] [x=U] [y=U] [z=U]"),
    ("zero_extruded_length", "clear the extruded-length counter"),
    ("move", "[x=P] [y=P] [z=P] [feed_rate=F] [filament=E] [extruding]"),
    ("extrude", "same as move, forcing G1"),
    ("get_position", "[detail=short|long]"),
];

/// Run the console until `quit` or EOF.
pub fn run(mut streamer: CommandStreamer) -> Result<()> {
    println!(
        "printkit {} - 'help' lists commands, 'go' sends the queue, 'quit' leaves.",
        printkit::VERSION
    );
    let stdin = io::stdin();
    loop {
        print!("gcode> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            return Ok(());
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match dispatch(&mut streamer, line) {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(e) => eprintln!("XX {}", e),
        }
    }
}

/// Handle one console line. Returns `Ok(true)` to leave the console.
fn dispatch(streamer: &mut CommandStreamer, line: &str) -> Result<bool> {
    let mut words = line.split_whitespace();
    let head = match words.next() {
        Some(head) => head,
        None => return Ok(false),
    };
    let rest: Vec<&str> = words.collect();

    match head {
        "quit" | "exit" => return Ok(true),
        "go" => {
            streamer.execute()?;
        }
        "list" => {
            if streamer.pending().is_empty() {
                println!("Nothing queued.");
            } else {
                println!("Queued commands:");
                for command in streamer.pending() {
                    println!("  {}", command);
                }
            }
        }
        "help" => print_help(&rest),
        _ => {
            let stripped = line.strip_prefix('\'').or_else(|| line.strip_prefix('"'));
            if let Some(raw) = stripped {
                queue_command(streamer, raw)?;
            } else {
                match build_op(head, &parse_kwargs(&rest))? {
                    Some(command) => {
                        println!("Queueing: {}", command);
                        streamer.queue(command);
                    }
                    // Not a builder name; take the whole line as raw G-code.
                    None => queue_command(streamer, line)?,
                }
            }
        }
    }
    Ok(false)
}

fn queue_command(streamer: &mut CommandStreamer, raw: &str) -> Result<()> {
    streamer.queue_raw(raw)?;
    if let Some(command) = streamer.pending().last() {
        println!("Queueing: {}", command);
    }
    Ok(())
}

fn print_help(args: &[&str]) {
    if args.is_empty() {
        println!("Console commands: go, list, help [op], quit.");
        println!("To queue raw gcode, start the line with a ' or \" character.");
        println!("Builders:");
        for (name, _) in OPS_HELP {
            println!("  {}", name);
        }
        return;
    }
    for arg in args {
        match OPS_HELP.iter().find(|(name, _)| name == arg) {
            Some((name, usage)) => println!("{}: {}", name, usage),
            None => println!("Unrecognized command: {}", arg),
        }
    }
}

fn parse_kwargs(tokens: &[&str]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for token in tokens {
        match token.split_once('=') {
            Some((key, value)) => {
                map.insert(key.to_string(), value.to_string());
            }
            // A bare word is a present flag.
            None => {
                map.insert(token.to_string(), String::new());
            }
        }
    }
    map
}

/// Build a command from a builder name and its key=value arguments.
/// `Ok(None)` means the name is not a builder.
fn build_op(name: &str, args: &HashMap<String, String>) -> CoreResult<Option<Command>> {
    let command = match name {
        "set_toolidx" => ops::set_toolidx(require_u32(args, "toolidx")?),
        "set_lineno" => ops::set_lineno(require_u32(args, "number")?)?,
        "set_hotendtemp" => ops::set_hotendtemp(
            require_f64(args, "celsius")?,
            get_u32(args, "toolidx")?,
            get_f64(args, "max_autotemp")?,
        )?,
        "get_temp" => ops::get_temp(get_u32(args, "toolidx")?)?,
        "wait_hotendtemp" => ops::wait_hotendtemp(
            require_f64(args, "celsius")?,
            get_u32(args, "toolidx")?,
            get_flag(args, "heat_to"),
            get_f64(args, "max_autotemp")?,
        )?,
        "wait_bedtemp" => ops::wait_bedtemp(require_f64(args, "celsius")?, get_flag(args, "heat_to"))?,
        "set_bedtemp" => ops::set_bedtemp(require_f64(args, "celsius")?)?,
        "set_extrudemode" => ops::set_extrudemode(require(args, "mode")?.parse()?),
        "set_units" => ops::set_units(require(args, "units")?.parse()?),
        "set_positioning" => ops::set_positioning(require(args, "mode")?.parse()?),
        "set_fanspeed" => ops::set_fanspeed(
            require_i32(args, "speed")?,
            get_u32(args, "fanidx")?,
            get_u32(args, "secondary")?,
        )?,
        "set_fanoff" => ops::set_fanoff(get_u32(args, "fanidx")?)?,
        "home_axis" => ops::home_axis(
            get_flag(args, "x"),
            get_flag(args, "y"),
            get_flag(args, "z"),
            get_flag(args, "optional"),
        )?,
        "home_all_axis" => ops::home_all_axis()?,
        "set_axis_steps" => ops::set_axis_steps(
            get_f64(args, "steps")?,
            get_u32(args, "extruderidx")?,
            get_f64(args, "x")?,
            get_f64(args, "y")?,
            get_f64(args, "z")?,
        )?,
        "zero_extruded_length" => ops::zero_extruded_length()?,
        "move" => ops::travel(travel_args(args)?)?,
        "extrude" => ops::extrude(travel_args(args)?)?,
        "get_position" => ops::get_position(get_detail(args)?)?,
        _ => return Ok(None),
    };
    Ok(Some(command))
}

fn travel_args(args: &HashMap<String, String>) -> CoreResult<Travel> {
    Ok(Travel {
        x: get_f64(args, "x")?,
        y: get_f64(args, "y")?,
        z: get_f64(args, "z")?,
        feed_rate: get_f64(args, "feed_rate")?,
        filament: get_f64(args, "filament")?,
        extruding: get_flag(args, "extruding"),
    })
}

fn get_detail(args: &HashMap<String, String>) -> CoreResult<Option<bool>> {
    match args.get("detail").map(String::as_str) {
        None => Ok(None),
        Some("short") => Ok(Some(false)),
        Some("long") => Ok(Some(true)),
        Some(other) => Err(invalid("detail", other)),
    }
}

fn require<'a>(args: &'a HashMap<String, String>, key: &str) -> CoreResult<&'a str> {
    args.get(key).map(String::as_str).ok_or_else(|| {
        GcodeError::InvalidSyntax {
            reason: format!("missing argument '{}'", key),
        }
        .into()
    })
}

fn get_f64(args: &HashMap<String, String>, key: &str) -> CoreResult<Option<f64>> {
    args.get(key)
        .map(|value| value.parse().map_err(|_| invalid(key, value)))
        .transpose()
}

fn require_f64(args: &HashMap<String, String>, key: &str) -> CoreResult<f64> {
    let value = require(args, key)?;
    value.parse().map_err(|_| invalid(key, value))
}

fn get_u32(args: &HashMap<String, String>, key: &str) -> CoreResult<Option<u32>> {
    args.get(key)
        .map(|value| value.parse().map_err(|_| invalid(key, value)))
        .transpose()
}

fn require_u32(args: &HashMap<String, String>, key: &str) -> CoreResult<u32> {
    let value = require(args, key)?;
    value.parse().map_err(|_| invalid(key, value))
}

fn require_i32(args: &HashMap<String, String>, key: &str) -> CoreResult<i32> {
    let value = require(args, key)?;
    value.parse().map_err(|_| invalid(key, value))
}

fn get_flag(args: &HashMap<String, String>, key: &str) -> bool {
    match args.get(key).map(String::as_str) {
        Some("") | Some("true") | Some("1") => true,
        _ => false,
    }
}

fn invalid(key: &str, value: &str) -> printkit_core::Error {
    GcodeError::InvalidSyntax {
        reason: format!("invalid value '{}' for '{}'", value, key),
    }
    .into()
}

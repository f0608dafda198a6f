use anyhow::Result;
use clap::Parser;
use printkit::init_logging;
use printkit_communication::{
    CommandStreamer, ConnectionParams, ConsoleSink, GriffinParams, GriffinShell, LineSink,
    SerialConnection, StreamerConfig,
};

mod console;

/// Interactive Marlin G-code console for 3D printers
#[derive(Debug, Parser)]
#[command(name = "printkit", version, about)]
struct Args {
    /// Serial port to open (e.g. /dev/ttyUSB0, COM5)
    #[arg(short, long, conflicts_with = "griffin")]
    port: Option<String>,

    /// Baud rate for the serial port
    #[arg(short, long, default_value_t = 115_200)]
    baud: u32,

    /// Network name/address of a Griffin-shell printer to drive over ssh
    #[arg(short, long)]
    griffin: Option<String>,

    /// Login user for the Griffin shell
    #[arg(short, long, default_value = "ultimaker")]
    user: String,

    /// Identity file to hand to ssh
    #[arg(short, long)]
    identity: Option<String>,

    /// Frame every eligible line with N<line> and *<checksum>
    #[arg(short, long)]
    checksum: bool,

    /// Strip comments from emitted lines
    #[arg(long)]
    no_comments: bool,
}

fn main() -> Result<()> {
    init_logging()?;
    let args = Args::parse();

    let sink: Box<dyn LineSink> = if let Some(host) = &args.griffin {
        let mut params = GriffinParams::new(host);
        params.user = args.user.clone();
        params.identity = args.identity.clone();
        Box::new(GriffinShell::connect(&params)?)
    } else if let Some(port) = &args.port {
        let mut connection = SerialConnection::open(ConnectionParams::new(port, args.baud))?;
        connection.listen();
        Box::new(connection)
    } else {
        tracing::info!("No port given; lines go to stdout (dry run)");
        Box::new(ConsoleSink)
    };

    let config = StreamerConfig {
        with_checksum: args.checksum,
        without_comments: args.no_comments,
    };
    console::run(CommandStreamer::new(sink, config))
}

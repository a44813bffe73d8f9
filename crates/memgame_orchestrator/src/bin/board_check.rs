use memgame_hal::traits::DaqBackend;
use memgame_orchestrator::{OrchestratorConfig, create_backend};

fn usage() -> ! {
    eprintln!(
        "Usage: board_check <config.toml> [on_ms] [cycles]\n\
         \n\
         Examples:\n\
           cargo run -p memgame_orchestrator --bin board_check -- \
             config/hal_modbus_tcp.toml 300 2\n\
         \n\
         Notes:\n\
         - Lights every output channel in turn, then prints the button states.\n\
         - Always forces all outputs OFF on exit (best effort)."
    );
    std::process::exit(2)
}

fn parse_u64(s: &str, name: &str) -> u64 {
    s.parse::<u64>().unwrap_or_else(|_| {
        eprintln!("Invalid {name}: {s}");
        usage()
    })
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| usage());
    let on_ms = args
        .next()
        .map(|s| parse_u64(&s, "on_ms"))
        .unwrap_or(300);
    let cycles = args
        .next()
        .map(|s| parse_u64(&s, "cycles"))
        .unwrap_or(1);

    let config = OrchestratorConfig::from_file(&config_path).unwrap_or_else(|e| {
        eprintln!("failed to load config: {e}");
        std::process::exit(2)
    });
    let mut hal = create_backend(&config).unwrap_or_else(|e| {
        eprintln!("failed to create backend: {e}");
        std::process::exit(2)
    });
    if let Err(e) = hal.init_device() {
        eprintln!("board did not start: {e}");
        return;
    }

    let outputs: Vec<usize> = config.channels.outputs().collect();
    'cycles: for _ in 0..cycles {
        for &channel in &outputs {
            hal.digital_write(channel, true);
            hal.delay_ms(on_ms);
            hal.digital_write(channel, false);
            if !hal.device_connected() {
                eprintln!("board disconnected");
                break 'cycles;
            }
        }
    }

    for (index, &channel) in config.channels.buttons.iter().enumerate() {
        let pressed = hal.digital_read(channel);
        let state = if pressed { "pressed" } else { "released" };
        println!("button {index} (channel {channel}): {state}");
    }

    // Best-effort fail-safe.
    for channel in outputs {
        hal.digital_write(channel, false);
    }
}

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("micomlink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: micomlink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("MICOMLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("default_device: {}", micomlink_transport::DEFAULT_DEVICE_PATH);
    println!(
        "features: session={}, buzzer={}, async={}, cli=true",
        cfg!(feature = "session"),
        cfg!(feature = "buzzer"),
        cfg!(feature = "async")
    );

    Ok(SUCCESS)
}

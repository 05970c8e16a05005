use anyhow::Context;
use crossbeam_channel as cbc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::sleep;

use elevatordispatch::config;
use elevatordispatch::elevio::{rig, sim};
use elevatordispatch::init;
use elevatordispatch::print;
use elevatordispatch::Dispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = init::parse_args();
    if args.help {
        init::print_help();
        return Ok(());
    }
    let dispatch_config = init::build_config(&args)?;

    let (command_tx, command_rx) = cbc::unbounded();
    let dispatcher = Dispatcher::new(dispatch_config.clone(), command_tx)
        .context("could not start the dispatcher")?;

    /* Riggen: enten simulert i prosessen, eller TCP mot ein ekte rigg */
    let _sim = if args.simulate {
        print::info("Running against the simulated rig, type commands on stdin".to_string());
        let rig = sim::spawn(dispatcher.clone(), command_rx);
        let console = dispatcher.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => console.handle_input(&line),
                    Ok(None) => break,
                    Err(e) => {
                        print::err(format!("stdin: {}", e));
                        break;
                    }
                }
            }
        });
        Some(rig)
    } else {
        print::info(format!("Connecting to rig at {}", dispatch_config.rig_addr));
        let _link = rig::spawn_link(dispatcher.clone(), command_rx, dispatch_config.rig_addr.clone());
        None
    };

    /* Statusutskrift */
    {
        let status = dispatcher.clone();
        tokio::spawn(async move {
            loop {
                sleep(config::STATUS_PRINT_PERIOD).await;
                print::bank_status(&status.snapshot());
            }
        });
    }

    tokio::signal::ctrl_c().await.context("could not listen for ctrl-c")?;
    print::info("Bye bye".to_string());
    Ok(())
}

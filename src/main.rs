use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use posture_pal::appsettings;
use posture_pal::platform::{
    CommandAlertSound, DesktopNotifier, DesktopPermissions, TokioWakeTimer,
};
use posture_pal::reminder::IntervalFields;
use posture_pal::scheduling::{BreakScheduler, ControlCommand, ReminderService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = appsettings::get();

    let (fired_tx, fired_rx) = mpsc::channel(16);
    let timer = Arc::new(TokioWakeTimer::new(fired_tx));
    let permissions = Arc::new(DesktopPermissions);
    let notifier = Arc::new(DesktopNotifier::new());
    let sound = Arc::new(CommandAlertSound);

    let scheduler = BreakScheduler::new(timer, permissions.clone(), notifier, sound);
    let fields = IntervalFields::new(&settings.interval.hours, &settings.interval.minutes);
    let service = ReminderService::new(scheduler, permissions, fields).await;

    let (command_tx, command_rx) = mpsc::channel(16);
    let service_task = tokio::spawn(service.run(command_rx, fired_rx));

    println!("posture-pal: on | off | interval <hours> <minutes> | status | quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        let command = match parts.next() {
            Some("on") => ControlCommand::ToggleOn,
            Some("off") => ControlCommand::ToggleOff,
            Some("interval") => {
                let (Some(hours), Some(minutes)) = (parts.next(), parts.next()) else {
                    println!("usage: interval <hours> <minutes>");
                    continue;
                };
                command_tx
                    .send(ControlCommand::SetHours(hours.to_string()))
                    .await?;
                ControlCommand::SetMinutes(minutes.to_string())
            }
            Some("status") => ControlCommand::Status,
            Some("quit") | Some("exit") => break,
            Some(other) => {
                println!("unknown command: {other}");
                continue;
            }
            None => continue,
        };
        command_tx.send(command).await?;
    }

    command_tx.send(ControlCommand::Shutdown).await.ok();
    service_task.await.context("reminder service task failed")?;

    Ok(())
}

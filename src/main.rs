// gaitgate - 基于姿态关键点的视频人物识别工具
// 主入口文件

mod args;

use args::{Args, Command};
use clap::Parser;
use gaitgate::commands;
use gaitgate::commands::run::RunOptions;
use gaitgate::config;
use gaitgate::error::{AppError, AppResult};
use gaitgate::logging;
use gaitgate::utils::get_app_data_dir;
use tracing::{error, info};

/// 取消退出码
const EXIT_CANCELLED: i32 = 130;

fn main() {
    let args = Args::parse();

    let app_dir = args.data_dir.clone().unwrap_or_else(get_app_data_dir);
    if let Err(e) = std::fs::create_dir_all(&app_dir) {
        eprintln!("创建数据目录失败 {:?}: {}", app_dir, e);
        std::process::exit(1);
    }

    // guard 必须保持存活，否则异步日志线程会退出
    let _log_guard = logging::init_logging(&app_dir);

    info!("gaitgate 启动中... 数据目录: {:?}", app_dir);

    if let Err(e) = execute(args, &app_dir) {
        match e {
            AppError::Cancelled { processed_frames } => {
                info!("运行已取消，已处理 {} 帧", processed_frames);
                std::process::exit(EXIT_CANCELLED);
            }
            e => {
                error!("执行失败: {}", e);
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    }
}

fn execute(args: Args, app_dir: &std::path::Path) -> AppResult<()> {
    config::init_config(&app_dir.join("config.json"))?;

    match args.command {
        Command::Run { recording, threshold, summary_out, stop_after } => {
            let options = RunOptions {
                recording,
                threshold,
                summary_out,
                stop_after,
            };
            let stdout = std::io::stdout();
            let report = commands::run::run_recording(&options, &config::get_config(), &mut stdout.lock())?;
            info!("[CLI] 运行完成: run_id={}, 准确率={:.2}%", report.run_id, report.summary.accuracy_pct);
        }
        Command::Config { set_threshold, reset } => {
            if reset {
                commands::config::reset_config()?;
            } else if let Some(threshold) = set_threshold {
                commands::config::set_threshold(threshold)?;
            }
            println!("{}", commands::config::show_config()?);
        }
    }

    Ok(())
}

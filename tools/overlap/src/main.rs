//! 计算源 stack 中一组 body 在目标 stack 中的对应 body.
//!
//! 用法: `overlap <body | @文件>...`. stack 路径见 `utils::loader`.

mod report;
mod runner;

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = simple_logger::init_with_level(log::Level::Info) {
        eprintln!("Failed to install logger: {e}");
    }

    match runner::run(std::env::args().skip(1)) {
        Ok(report) => {
            utils::sep();
            report.analyze();
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

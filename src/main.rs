use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use teamform::app::Application;
use teamform::client::HttpTaskClient;
use teamform::shutdown::{wait_for_shutdown_signal, ShutdownManager};
use teamform_config::{AppConfig, LogFormat};
use teamform_domain::{Algorithm, AlgorithmInfo, TaskStatus, TeamFormationRequest};
use teamform_orchestrator::{PollOutcome, PollerConfig, TaskPoller};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn cli() -> Command {
    Command::new("teamform")
        .version(env!("CARGO_PKG_VERSION"))
        .about("基于技能与合作关系图谱的异步团队组建服务")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别（默认取配置文件）")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .global(true),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式（默认取配置文件）")
                .value_parser(["json", "pretty"])
                .global(true),
        )
        .subcommand(Command::new("serve").about("启动任务编排器和API服务器（默认）"))
        .subcommand(
            Command::new("submit")
                .about("向运行中的服务提交任务并轮询结果")
                .arg(server_arg())
                .arg(
                    Arg::new("algorithm")
                        .short('a')
                        .long("algorithm")
                        .value_name("CODE")
                        .default_value("ACET"),
                )
                .arg(
                    Arg::new("keywords")
                        .short('k')
                        .long("keywords")
                        .value_name("SKILLS")
                        .help("逗号分隔的技能关键词")
                        .value_delimiter(',')
                        .required(true),
                )
                .arg(
                    Arg::new("team-size")
                        .long("team-size")
                        .value_parser(clap::value_parser!(i64))
                        .default_value("3"),
                )
                .arg(
                    Arg::new("num-teams")
                        .long("num-teams")
                        .value_parser(clap::value_parser!(i64))
                        .default_value("1"),
                )
                .arg(
                    Arg::new("priorities")
                        .long("priorities")
                        .value_name("SKILLS")
                        .help("PRT 使用的技能优先级，逗号分隔")
                        .value_delimiter(','),
                )
                .arg(
                    Arg::new("max-polls")
                        .long("max-polls")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("600"),
                )
                .arg(
                    Arg::new("no-wait")
                        .long("no-wait")
                        .help("只提交，不等待结果")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("algorithms").about("列出可用的团队组建算法"))
        .subcommand(
            Command::new("keywords")
                .about("列出运行中服务的候选池技能关键词")
                .arg(server_arg())
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("100"),
                ),
        )
        .subcommand(
            Command::new("search")
                .about("按姓名或技能搜索候选人")
                .arg(server_arg())
                .arg(Arg::new("query").value_name("QUERY").required(true))
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                ),
        )
}

fn server_arg() -> Arg {
    Arg::new("server")
        .long("server")
        .value_name("URL")
        .default_value("http://127.0.0.1:8080")
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let config_path = matches.get_one::<String>("config").map(String::as_str);
    let config = AppConfig::load(config_path).context("加载配置失败")?;

    let log_level = matches
        .get_one::<String>("log-level")
        .cloned()
        .unwrap_or_else(|| config.observability.log_level.clone());
    let log_format = match matches.get_one::<String>("log-format") {
        Some(format) => format
            .parse::<LogFormat>()
            .map_err(|e| anyhow::anyhow!(e))?,
        None => config.observability.log_format,
    };
    init_logging(&log_level, log_format)?;

    match matches.subcommand() {
        Some(("submit", sub)) => run_submit(&config, sub).await,
        Some(("algorithms", _)) => {
            print_algorithms(Algorithm::all().into_iter().map(AlgorithmInfo::from).collect());
            Ok(())
        }
        Some(("keywords", sub)) => {
            let limit = sub.get_one::<usize>("limit").copied().unwrap_or(100);
            for keyword in connect(&config, sub)?.keywords(limit).await? {
                println!("{keyword}");
            }
            Ok(())
        }
        Some(("search", sub)) => {
            let query = sub.get_one::<String>("query").map(String::as_str).unwrap_or_default();
            let limit = sub.get_one::<usize>("limit").copied().unwrap_or(10);
            for candidate in connect(&config, sub)?.search_candidates(query, limit).await? {
                println!(
                    "{:<6} {:<24} {}",
                    candidate.id,
                    candidate.name,
                    candidate.skills.join(", ")
                );
            }
            Ok(())
        }
        _ => run_server(config).await,
    }
}

/// 初始化日志系统
fn init_logging(log_level: &str, log_format: LogFormat) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        LogFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("初始化JSON日志格式失败")?;
        }
        LogFormat::Pretty => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("初始化Pretty日志格式失败")?;
        }
    }

    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    info!("启动团队组建服务");

    let app = Arc::new(Application::new(config).await?);
    let shutdown_manager = ShutdownManager::new();

    let app_handle = {
        let app = Arc::clone(&app);
        let shutdown_rx = shutdown_manager.subscribe().await;
        tokio::spawn(async move {
            if let Err(e) = app.run(shutdown_rx).await {
                error!("应用运行失败: {e:#}");
            }
        })
    };

    wait_for_shutdown_signal().await;
    info!("收到关闭信号，开始优雅关闭...");
    shutdown_manager.shutdown().await;

    match tokio::time::timeout(Duration::from_secs(30), app_handle).await {
        Ok(Ok(())) => info!("应用已优雅关闭"),
        Ok(Err(e)) => error!("应用关闭时发生错误: {e}"),
        Err(_) => warn!("应用关闭超时，强制退出"),
    }

    info!("团队组建服务已退出");
    Ok(())
}

fn connect(config: &AppConfig, matches: &ArgMatches) -> Result<HttpTaskClient> {
    let server = matches
        .get_one::<String>("server")
        .map(String::as_str)
        .unwrap_or("http://127.0.0.1:8080");
    Ok(HttpTaskClient::new(
        server,
        Duration::from_secs(config.api.request_timeout_seconds),
    )?)
}

async fn run_submit(config: &AppConfig, matches: &ArgMatches) -> Result<()> {
    let strings = |id: &str| -> Vec<String> {
        matches
            .get_many::<String>(id)
            .map(|values| values.cloned().collect())
            .unwrap_or_default()
    };
    let request = TeamFormationRequest {
        algorithm: matches
            .get_one::<String>("algorithm")
            .cloned()
            .unwrap_or_default(),
        keywords: strings("keywords"),
        team_size: matches.get_one::<i64>("team-size").copied().unwrap_or(3),
        num_teams: matches.get_one::<i64>("num-teams").copied().unwrap_or(1),
        skill_priorities: strings("priorities"),
    };
    let client = Arc::new(connect(config, matches)?);
    let task_id = client.submit(&request).await?;
    println!("任务已提交: {task_id}");
    if matches.get_flag("no-wait") {
        return Ok(());
    }

    let poller = TaskPoller::new(
        client,
        PollerConfig {
            max_polls: matches.get_one::<usize>("max-polls").copied().unwrap_or(600),
            ..PollerConfig::default()
        },
    );
    let outcome = poller
        .wait(&task_id, |snapshot| {
            println!(
                "[{:>3}%] {} - {}",
                snapshot.progress,
                snapshot.status.as_str(),
                snapshot.message
            );
        })
        .await?;

    match outcome {
        PollOutcome::Terminal(snapshot) => match snapshot.status {
            TaskStatus::Completed => {
                println!("{}", serde_json::to_string_pretty(&snapshot.result)?);
                Ok(())
            }
            TaskStatus::Failed => {
                if let Some(detail) = &snapshot.error {
                    eprintln!("任务失败 [{}]: {}", detail.kind, detail.message);
                    for suggestion in &detail.suggestions {
                        eprintln!("  - {suggestion}");
                    }
                }
                anyhow::bail!("任务 {task_id} 失败")
            }
            _ => anyhow::bail!("任务 {task_id} 已取消"),
        },
        PollOutcome::Exhausted { polls, .. } => {
            anyhow::bail!("轮询 {polls} 次后任务 {task_id} 仍未结束，可稍后再次查询")
        }
    }
}

fn print_algorithms(algorithms: Vec<AlgorithmInfo>) {
    for algorithm in algorithms {
        println!("{:<5} {}", algorithm.id, algorithm.name);
        println!("      {}", algorithm.description);
    }
}

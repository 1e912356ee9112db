//! EndoMapper Simulator 数据集下载工具.
//!
//! 通过 Synapse REST API 把一个远端集合 (默认为 simulator 序列集合
//! `syn30304069`) 递归同步到本地目录, 保持远端的目录结构.
//!
//! # 鉴权
//!
//! 访问令牌只从环境变量 `SYNAPSE_AUTH_TOKEN` 读取. 数据集使用条款
//! 禁止转发令牌, 因此不允许把它写进源码或命令行参数.
//!
//! # 注意
//!
//! 下载是阻塞、串行的, 没有重试与断点续传; 中断后重新运行即可.

use clap::Parser;
use serde::Deserialize;
use std::env;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Synapse REST API 入口.
const REPO_ENDPOINT: &str = "https://repo-prod.prod.sagebase.org/repo/v1";

/// 存放访问令牌的环境变量名.
const TOKEN_ENV: &str = "SYNAPSE_AUTH_TOKEN";

/// 命令行参数.
#[derive(Debug, Parser)]
#[command(author, version, about = "从 Synapse 同步 EndoMapper Simulator 数据集")]
struct Args {
    /// 要同步的 Synapse 实体 ID.
    #[arg(long, default_value = "syn30304069")]
    entity: String,

    /// 本地输出目录. 缺省为 `{用户主目录}/dataset/endomapper_simulator`.
    #[arg(long)]
    output: Option<PathBuf>,
}

/// 同步错误.
#[derive(Debug)]
enum SyncError {
    /// 环境变量中没有访问令牌.
    MissingToken(&'static str),

    /// HTTP 请求错误.
    Http(Box<ureq::Error>),

    /// 响应解析或本地写盘错误.
    Io(io::Error),
}

/// `POST /entity/children` 的单页响应.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChildrenPage {
    page: Vec<EntityHeader>,
    next_page_token: Option<String>,
}

/// 子实体摘要.
#[derive(Debug, Deserialize)]
struct EntityHeader {
    id: String,
    name: String,
    #[serde(rename = "type")]
    entity_type: String,
}

impl EntityHeader {
    /// 实体是否是目录 (`org.sagebionetworks.repo.model.Folder`).
    #[inline]
    fn is_folder(&self) -> bool {
        self.entity_type.ends_with(".Folder")
    }
}

/// 只读的 Synapse 客户端.
struct Client {
    agent: ureq::Agent,
    token: String,
}

impl Client {
    /// 从环境变量初始化客户端.
    fn from_env() -> Result<Client, SyncError> {
        let token = env::var(TOKEN_ENV).map_err(|_| SyncError::MissingToken(TOKEN_ENV))?;
        Ok(Self {
            agent: ureq::agent(),
            token,
        })
    }

    /// 列出 `parent` 的一页子实体 (目录与文件).
    fn children_page(
        &self,
        parent: &str,
        page_token: Option<&str>,
    ) -> Result<ChildrenPage, SyncError> {
        let body = serde_json::json!({
            "parentId": parent,
            "includeTypes": ["folder", "file"],
            "nextPageToken": page_token,
        });
        let resp = self
            .agent
            .post(&format!("{REPO_ENDPOINT}/entity/children"))
            .set("Authorization", &format!("Bearer {}", self.token))
            .send_json(body)
            .map_err(|e| SyncError::Http(Box::new(e)))?;
        resp.into_json().map_err(SyncError::Io)
    }

    /// 递归同步 `parent` 的全部内容到 `dir`. 返回下载的文件数.
    fn sync(&self, parent: &str, dir: &Path) -> Result<u64, SyncError> {
        fs::create_dir_all(dir).map_err(SyncError::Io)?;

        let mut count = 0;
        let mut page_token: Option<String> = None;
        loop {
            let page = self.children_page(parent, page_token.as_deref())?;
            for child in &page.page {
                if child.is_folder() {
                    count += self.sync(&child.id, &dir.join(&child.name))?;
                } else {
                    self.download_file(&child.id, &dir.join(&child.name))?;
                    count += 1;
                }
            }
            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }
        Ok(count)
    }

    /// 下载单个文件实体的当前版本.
    ///
    /// `GET /entity/{id}/file` 会重定向到实际的预签名下载地址,
    /// ureq 默认跟随重定向.
    fn download_file(&self, id: &str, path: &Path) -> Result<(), SyncError> {
        log::info!("下载 {id} -> {}", path.display());
        let resp = self
            .agent
            .get(&format!("{REPO_ENDPOINT}/entity/{id}/file"))
            .set("Authorization", &format!("Bearer {}", self.token))
            .call()
            .map_err(|e| SyncError::Http(Box::new(e)))?;

        let mut file = File::create(path).map_err(SyncError::Io)?;
        io::copy(&mut resp.into_reader(), &mut file).map_err(SyncError::Io)?;
        Ok(())
    }
}

/// 默认输出目录: `{用户主目录}/dataset/endomapper_simulator`.
fn default_output() -> PathBuf {
    endo_berry::dataset::home_dataset_dir_with(["endomapper_simulator"])
        .expect("无法定位用户主目录, 请用 --output 显式指定输出路径")
}

fn main() {
    simple_logger::init_with_level(log::Level::Info).expect("logger init");

    if let Err(err) = try_main() {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), SyncError> {
    let args = Args::parse();
    let output = args.output.unwrap_or_else(default_output);

    let client = Client::from_env()?;
    let count = client.sync(&args.entity, &output)?;
    println!("Synced {count} files to {}", output.display());
    Ok(())
}

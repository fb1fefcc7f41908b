//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 管理应用生命周期，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! App (初始化 / 运行 / 退出)
//!     ↓
//! api (路由、校验、响应)
//!     ↓
//! workflow::GenerateFlow (处理单个请求)
//!     ↓
//! services (能力层：解析 / PDF 装配 / DOCX 装配)
//!     ↓
//! infrastructure (基础设施：打印引擎、PDF 重组、DOCX 写出、临时文件)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有打印引擎和临时文件登记表
//! 2. **向下依赖**：编排层 → api → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度，不做具体的文档装配

pub mod app;

pub use app::App;

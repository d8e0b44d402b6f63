//! 单元测试模块
//! 覆盖标记解析、样式级联、行内标记、组件展开、状态与动作分发

pub mod component_tests;
pub mod render_tests;
pub mod state_tests;

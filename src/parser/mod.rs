//! 文档语言解析：标记、样式规则、行内文本

pub mod inline;
pub mod markup;
pub mod serializer;
pub mod style;

pub use inline::{InlineResolver, StyledText, TextSpan};
pub use markup::{clean_text, parse, Element, Node};
pub use serializer::serialize;
pub use style::{FrameStyle, HAlign, Overflow, Selector, Sizing, Style, StylePatch, StyleRule, VAlign};

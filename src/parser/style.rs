//! 样式规则解析器 - 选择器块与属性包

use serde::Serialize;

/// 水平对齐
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    Start,
    Center,
    End,
}

/// 垂直对齐
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    Start,
    Center,
    End,
}

/// 单轴溢出策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Overflow {
    Visible,
    Hide,
    Auto,
    Scroll,
}

/// 尺寸：固定、收缩、按比例填充
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sizing {
    Auto,
    Fixed(u16),
    Shrink,
    Fill(u16),
}

/// 边框：无、单一种类、按边列表
///
/// 四元列表的边序取 `[top, right, bottom, left]`，这是从参考输出推断的
/// 约定，见 DESIGN.md。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameStyle {
    None,
    Single(String),
    Edges([Option<String>; 4]),
}

/// 解析后的完整样式包，交给外部布局/绘制后端
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Style {
    pub palette: Option<String>,
    pub frame: FrameStyle,
    pub alignment: (HAlign, VAlign),
    pub gap: u16,
    pub overflow: (Overflow, Overflow),
    pub width: Sizing,
    pub height: Sizing,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            palette: None,
            frame: FrameStyle::None,
            alignment: (HAlign::Start, VAlign::Start),
            gap: 0,
            overflow: (Overflow::Visible, Overflow::Visible),
            width: Sizing::Auto,
            height: Sizing::Auto,
        }
    }
}

/// 一条规则里出现的属性子集；级联时逐属性合并，后者覆盖前者
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StylePatch {
    pub palette: Option<String>,
    pub frame: Option<FrameStyle>,
    pub alignment: Option<(HAlign, VAlign)>,
    pub gap: Option<u16>,
    pub overflow: Option<(Overflow, Overflow)>,
    pub width: Option<Sizing>,
    pub height: Option<Sizing>,
}

impl StylePatch {
    pub fn is_empty(&self) -> bool {
        *self == StylePatch::default()
    }

    /// 逐属性合并，`other` 中已设置的属性覆盖自身
    pub fn merge(&mut self, other: &StylePatch) {
        if other.palette.is_some() {
            self.palette = other.palette.clone();
        }
        if other.frame.is_some() {
            self.frame = other.frame.clone();
        }
        if other.alignment.is_some() {
            self.alignment = other.alignment;
        }
        if other.gap.is_some() {
            self.gap = other.gap;
        }
        if other.overflow.is_some() {
            self.overflow = other.overflow;
        }
        if other.width.is_some() {
            self.width = other.width.clone();
        }
        if other.height.is_some() {
            self.height = other.height.clone();
        }
    }

    /// 把补丁应用到完整样式包上
    pub fn apply(&self, style: &mut Style) {
        if let Some(palette) = &self.palette {
            style.palette = Some(palette.clone());
        }
        if let Some(frame) = &self.frame {
            style.frame = frame.clone();
        }
        if let Some(alignment) = self.alignment {
            style.alignment = alignment;
        }
        if let Some(gap) = self.gap {
            style.gap = gap;
        }
        if let Some(overflow) = self.overflow {
            style.overflow = overflow;
        }
        if let Some(width) = &self.width {
            style.width = width.clone();
        }
        if let Some(height) = &self.height {
            style.height = height.clone();
        }
    }
}

/// 选择器：`tag`、`.group`、`tag.group`、`*`
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub tag: Option<String>,
    pub group: Option<String>,
}

impl Selector {
    pub fn parse(text: &str) -> Option<Selector> {
        let text = text.trim();
        if text.is_empty() || text.contains(char::is_whitespace) {
            return None;
        }

        if text == "*" {
            return Some(Selector { tag: None, group: None });
        }

        if let Some(dot) = text.find('.') {
            let tag = &text[..dot];
            let group = &text[dot + 1..];
            if group.is_empty() {
                return None;
            }
            return Some(Selector {
                tag: if tag.is_empty() { None } else { Some(tag.to_string()) },
                group: Some(group.to_string()),
            });
        }

        Some(Selector {
            tag: Some(text.to_string()),
            group: None,
        })
    }

    pub fn matches(&self, tag: &str, groups: &[&str]) -> bool {
        if let Some(wanted) = &self.tag {
            if wanted != tag {
                return false;
            }
        }
        if let Some(wanted) = &self.group {
            if !groups.contains(&wanted.as_str()) {
                return false;
            }
        }
        true
    }

    /// 同序位置下更具体的选择器优先
    pub fn specificity(&self) -> u8 {
        self.tag.is_some() as u8 + self.group.is_some() as u8 * 2
    }
}

/// 一条样式规则：选择器 + 属性补丁
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    pub selector: Selector,
    pub patch: StylePatch,
}

/// 解析出来的样式块：节点自身的裸属性行 + 带选择器的子规则
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleBlock {
    pub own: StylePatch,
    pub rules: Vec<StyleRule>,
}

/// 样式块语法：以 `:` 结尾的行开启一个选择器块，缩进行归属于它；
/// 不在任何块里的 `prop: value` 行直接作用于宿主节点。
/// 无法识别的属性按原实现的宽松策略静默跳过。
pub fn parse_block(text: &str) -> StyleBlock {
    let mut block = StyleBlock::default();
    let mut current: Option<(Selector, StylePatch)> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let indented = line.starts_with(' ') || line.starts_with('\t');

        // 选择器头：`name:` 且冒号后没有值
        if let Some(head) = trimmed.strip_suffix(':') {
            if !head.contains(':') && Selector::parse(head).is_some() && !indented {
                if let Some((selector, patch)) = current.take() {
                    block.rules.push(StyleRule { selector, patch });
                }
                current = Selector::parse(head).map(|s| (s, StylePatch::default()));
                continue;
            }
        }

        let Some((name, value)) = split_property(trimmed) else {
            continue;
        };

        let target = match (&mut current, indented) {
            (Some((_, patch)), true) => patch,
            _ => {
                // 回到裸属性行，结束当前选择器块
                if let Some((selector, patch)) = current.take() {
                    block.rules.push(StyleRule { selector, patch });
                }
                &mut block.own
            }
        };
        set_property(target, &name, &value);
    }

    if let Some((selector, patch)) = current.take() {
        block.rules.push(StyleRule { selector, patch });
    }

    block
}

fn split_property(line: &str) -> Option<(String, String)> {
    let colon = line.find(':')?;
    let name = line[..colon].trim().to_string();
    let value = line[colon + 1..].trim().to_string();
    if name.is_empty() || value.is_empty() {
        return None;
    }
    Some((name, value))
}

fn set_property(patch: &mut StylePatch, name: &str, value: &str) {
    match name {
        "palette" => patch.palette = Some(value.trim_matches('"').to_string()),
        "frame" => patch.frame = parse_frame(value),
        "alignment" => patch.alignment = parse_alignment(value),
        "gap" => patch.gap = value.parse().ok(),
        "overflow" => patch.overflow = parse_overflow(value),
        "width" => patch.width = parse_sizing(value),
        "height" => patch.height = parse_sizing(value),
        _ => {}
    }
}

/// `[a, b]` 列表值
fn parse_list(value: &str) -> Option<Vec<String>> {
    let inner = value.trim().strip_prefix('[')?.strip_suffix(']')?;
    Some(
        inner
            .split(',')
            .map(|item| item.trim().to_string())
            .collect(),
    )
}

fn parse_frame(value: &str) -> Option<FrameStyle> {
    if let Some(items) = parse_list(value) {
        if items.len() != 4 {
            return None;
        }
        let mut edges: [Option<String>; 4] = [None, None, None, None];
        for (i, item) in items.iter().enumerate() {
            if !item.is_empty() && item != "none" {
                edges[i] = Some(item.clone());
            }
        }
        return Some(FrameStyle::Edges(edges));
    }

    if value == "none" {
        return Some(FrameStyle::None);
    }
    Some(FrameStyle::Single(value.to_string()))
}

fn parse_alignment(value: &str) -> Option<(HAlign, VAlign)> {
    let items = parse_list(value)?;
    if items.len() != 2 {
        return None;
    }

    let horizontal = match items[0].as_str() {
        "start" | "left" => HAlign::Start,
        "center" => HAlign::Center,
        "end" | "right" => HAlign::End,
        _ => return None,
    };
    let vertical = match items[1].as_str() {
        "start" | "top" => VAlign::Start,
        "center" => VAlign::Center,
        "end" | "bottom" => VAlign::End,
        _ => return None,
    };

    Some((horizontal, vertical))
}

fn parse_overflow(value: &str) -> Option<(Overflow, Overflow)> {
    let one = |name: &str| match name {
        "visible" => Some(Overflow::Visible),
        "hide" => Some(Overflow::Hide),
        "auto" => Some(Overflow::Auto),
        "scroll" => Some(Overflow::Scroll),
        _ => None,
    };

    if let Some(items) = parse_list(value) {
        if items.len() != 2 {
            return None;
        }
        return Some((one(&items[0])?, one(&items[1])?));
    }

    // 单值同时作用于两个轴
    let both = one(value)?;
    Some((both, both))
}

fn parse_sizing(value: &str) -> Option<Sizing> {
    match value {
        "auto" => return Some(Sizing::Auto),
        "shrink" => return Some(Sizing::Shrink),
        "fill" => return Some(Sizing::Fill(1)),
        _ => {}
    }

    // 两种带权写法都收：`fill(3)` 和 `fill:3`
    if let Some(inner) = value.strip_prefix("fill(").and_then(|v| v.strip_suffix(')')) {
        return inner.trim().parse().ok().map(Sizing::Fill);
    }
    if let Some(inner) = value.strip_prefix("fill:") {
        return inner.trim().parse().ok().map(Sizing::Fill);
    }

    value.parse().ok().map(Sizing::Fixed)
}

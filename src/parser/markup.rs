//! 标记解析器 - 把文档文本解析成节点树

use crate::error::ParseError;

/// 解析级节点
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// `<script>` 块，正文原样保留
    Script(String),
    /// `<style>` 块，正文原样保留
    Style(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// 元素节点：标签、有序属性表、子节点
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        for (key, existing) in self.attrs.iter_mut() {
            if key == name {
                *existing = value.to_string();
                return;
            }
        }
        self.attrs.push((name.to_string(), value.to_string()));
    }

    pub fn eid(&self) -> Option<&str> {
        self.attr("eid")
    }

    /// `groups` 属性按空格拆分
    pub fn groups(&self) -> Vec<&str> {
        self.attr("groups")
            .map(|value| value.split_whitespace().collect())
            .unwrap_or_default()
    }
}

/// 入口：文档文本 -> 节点序列
pub fn parse(source: &str) -> Result<Vec<Node>, ParseError> {
    let mut parser = MarkupParser::new(source);
    let nodes = parser.parse_nodes()?;

    // 顶层残留的闭合标签说明没有与之配对的打开标签
    parser.skip_whitespace();
    if parser.starts_with("</") {
        parser.advance_by(2);
        let found = parser.parse_name();
        return Err(ParseError::MismatchedClosingTag {
            expected: String::new(),
            found,
        });
    }

    Ok(nodes)
}

/// 标记解析器
pub struct MarkupParser {
    input: Vec<char>,
    pos: usize,
}

impl MarkupParser {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    fn parse_nodes(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();

        while self.pos < self.input.len() {
            if self.starts_with("<!--") {
                self.skip_comment();
            } else if self.starts_with("</") {
                break; // 交给上层校验闭合标签
            } else if self.current_char() == '<' {
                nodes.push(self.parse_element()?);
            } else {
                if let Some(text) = self.parse_text() {
                    nodes.push(Node::Text(text));
                }
            }
        }

        Ok(nodes)
    }

    fn parse_element(&mut self) -> Result<Node, ParseError> {
        self.advance(); // '<'

        let tag = self.parse_name();
        if tag.is_empty() {
            return Err(ParseError::InvalidAttribute {
                tag: String::new(),
                detail: "empty tag name".to_string(),
            });
        }

        let mut element = Element::new(&tag);

        // 属性
        loop {
            self.skip_whitespace();

            if self.pos >= self.input.len() {
                return Err(ParseError::UnclosedTag { tag });
            }
            if self.current_char() == '>' || self.starts_with("/>") {
                break;
            }

            let (name, value) = self.parse_attribute(&tag)?;
            element.attrs.push((name, value));
        }

        // 自闭合
        if self.starts_with("/>") {
            self.advance_by(2);
            return Ok(self.finish(element));
        }

        self.advance(); // '>'

        // script/style 正文原样保留到对应闭合标签
        if tag == "script" || tag == "style" {
            let body = self.parse_verbatim(&tag)?;
            return Ok(if tag == "script" {
                Node::Script(body)
            } else {
                Node::Style(body)
            });
        }

        element.children = self.parse_nodes()?;

        // 闭合标签
        if self.starts_with("</") {
            self.advance_by(2);
            let end_tag = self.parse_name();
            if end_tag != tag {
                return Err(ParseError::MismatchedClosingTag {
                    expected: tag,
                    found: end_tag,
                });
            }
            self.skip_whitespace();
            if self.current_char() != '>' {
                return Err(ParseError::UnclosedTag { tag });
            }
            self.advance();
        } else {
            return Err(ParseError::UnclosedTag { tag });
        }

        Ok(self.finish(element))
    }

    /// 自闭合的 script/style 视为空正文块
    fn finish(&self, element: Element) -> Node {
        match element.tag.as_str() {
            "script" => Node::Script(String::new()),
            "style" => Node::Style(String::new()),
            _ => Node::Element(element),
        }
    }

    fn parse_verbatim(&mut self, tag: &str) -> Result<String, ParseError> {
        let close = format!("</{}>", tag);
        let mut body = String::new();

        while self.pos < self.input.len() {
            if self.starts_with(&close) {
                self.advance_by(close.chars().count());
                return Ok(clean_text(&body).unwrap_or_default());
            }
            body.push(self.current_char());
            self.advance();
        }

        Err(ParseError::UnclosedTag { tag: tag.to_string() })
    }

    fn parse_name(&mut self) -> String {
        let mut name = String::new();
        while self.pos < self.input.len() {
            let c = self.current_char();
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        name
    }

    fn parse_attribute(&mut self, tag: &str) -> Result<(String, String), ParseError> {
        let name = self.parse_name();
        if name.is_empty() {
            return Err(ParseError::InvalidAttribute {
                tag: tag.to_string(),
                detail: format!("unexpected character '{}'", self.current_char()),
            });
        }

        self.skip_whitespace();

        // 裸属性：没有值
        if self.current_char() != '=' {
            return Ok((name, String::new()));
        }
        self.advance();
        self.skip_whitespace();

        let quote = self.current_char();
        if quote != '"' && quote != '\'' {
            return Err(ParseError::InvalidAttribute {
                tag: tag.to_string(),
                detail: format!("attribute '{}' is missing a quoted value", name),
            });
        }
        self.advance();

        let mut value = String::new();
        while self.pos < self.input.len() && self.current_char() != quote {
            value.push(self.current_char());
            self.advance();
        }

        if self.pos >= self.input.len() {
            return Err(ParseError::InvalidAttribute {
                tag: tag.to_string(),
                detail: format!("unterminated value for attribute '{}'", name),
            });
        }
        self.advance(); // 闭合引号

        Ok((name, decode_entities(&value)))
    }

    fn parse_text(&mut self) -> Option<String> {
        let mut text = String::new();
        while self.pos < self.input.len() && self.current_char() != '<' {
            text.push(self.current_char());
            self.advance();
        }

        clean_text(&decode_entities(&text))
    }

    fn skip_comment(&mut self) {
        self.advance_by(4); // "<!--"
        while self.pos < self.input.len() && !self.starts_with("-->") {
            self.advance();
        }
        self.advance_by(3);
    }

    fn current_char(&self) -> char {
        if self.pos < self.input.len() {
            self.input[self.pos]
        } else {
            '\0'
        }
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn advance_by(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.input.len());
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        let chars: Vec<char> = s.chars().collect();
        for (i, c) in chars.iter().enumerate() {
            if self.pos + i >= self.input.len() || self.input[self.pos + i] != *c {
                return false;
            }
        }
        true
    }
}

/// 文本节点的空白策略：去掉公共缩进和首尾空行，保留内部换行。
/// 纯空白文本返回 `None`，在元素之间被丢弃。
pub fn clean_text(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }

    let lines: Vec<&str> = raw.lines().collect();

    // 非空行的公共缩进，按字符计数；缩进可能混用多字节空白
    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let dedented: Vec<String> = lines
        .iter()
        .map(|line| {
            let mut rest = *line;
            for _ in 0..indent {
                match rest.chars().next() {
                    Some(c) if c.is_whitespace() => rest = &rest[c.len_utf8()..],
                    _ => break,
                }
            }
            rest.to_string()
        })
        .collect();

    // 去掉首尾空行
    let start = dedented.iter().position(|line| !line.trim().is_empty())?;
    let end = dedented.iter().rposition(|line| !line.trim().is_empty())?;

    Some(dedented[start..=end].join("\n"))
}

/// 实体转义：字段里放字面标记文本的机制
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

/// 序列化时的反向转义
pub fn encode_entities(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

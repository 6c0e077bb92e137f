//! Static symbol dictionary for autocomplete.
//!
//! Entries are searched by trigger prefix in table order. LaTeX triggers use
//! letter placeholders (`{a}`, `{x}`) that are normalized on commit.

/// Bumped whenever entries are added, removed or reordered.
pub const DICTIONARY_VERSION: u32 = 3;

/// Which family an entry belongs to. Decides how it is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolCategory {
    Latex,
    Markdown,
    Question,
}

impl SymbolCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolCategory::Latex => "latex",
            SymbolCategory::Markdown => "markdown",
            SymbolCategory::Question => "question",
        }
    }
}

/// One dictionary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolEntry {
    /// What the user types, starting with `\`.
    pub trigger: &'static str,
    pub description: &'static str,
    pub category: SymbolCategory,
    /// Literal insertion text for keyword entries whose trigger is not the
    /// text to insert.
    pub body: Option<&'static str>,
}

impl SymbolEntry {
    const fn latex(trigger: &'static str, description: &'static str) -> Self {
        Self {
            trigger,
            description,
            category: SymbolCategory::Latex,
            body: None,
        }
    }

    const fn markdown(trigger: &'static str, description: &'static str, body: &'static str) -> Self {
        Self {
            trigger,
            description,
            category: SymbolCategory::Markdown,
            body: Some(body),
        }
    }

    const fn question(trigger: &'static str, description: &'static str, body: &'static str) -> Self {
        Self {
            trigger,
            description,
            category: SymbolCategory::Question,
            body: Some(body),
        }
    }

    /// Text committed for this entry before any normalization.
    pub fn insertion(&self) -> &'static str {
        self.body.unwrap_or(self.trigger)
    }
}

static DICTIONARY: &[SymbolEntry] = &[
    // Structures
    SymbolEntry::latex(r"\frac{a}{b}", "分数"),
    SymbolEntry::latex(r"\dfrac{a}{b}", "分数（显示大小）"),
    SymbolEntry::latex(r"\sqrt{x}", "平方根"),
    SymbolEntry::latex(r"\sqrt[n]{x}", "n 次方根"),
    SymbolEntry::latex(r"\overline{ab}", "上划线"),
    SymbolEntry::latex(r"\underline{ab}", "下划线"),
    SymbolEntry::latex(r"\vec{a}", "向量"),
    SymbolEntry::latex(r"\overrightarrow{AB}", "有向线段"),
    SymbolEntry::latex(r"\hat{a}", "尖帽"),
    SymbolEntry::latex(r"\bar{x}", "平均值"),
    SymbolEntry::latex(r"\dot{x}", "点"),
    SymbolEntry::latex(r"\binom{n}{k}", "组合数"),
    SymbolEntry::latex(r"\left( \right)", "自适应圆括号"),
    SymbolEntry::latex(r"\left[ \right]", "自适应方括号"),
    SymbolEntry::latex(r"\left\{ \right\}", "自适应花括号"),
    SymbolEntry::latex(r"\left| \right|", "自适应绝对值"),
    // Operators
    SymbolEntry::latex(r"\sum_{i=1}^{n}", "求和"),
    SymbolEntry::latex(r"\prod_{i=1}^{n}", "求积"),
    SymbolEntry::latex(r"\int_{a}^{b}", "定积分"),
    SymbolEntry::latex(r"\iint", "二重积分"),
    SymbolEntry::latex(r"\oint", "环路积分"),
    SymbolEntry::latex(r"\lim_{x \to 0}", "极限"),
    SymbolEntry::latex(r"\log_{a}{b}", "对数"),
    SymbolEntry::latex(r"\ln", "自然对数"),
    SymbolEntry::latex(r"\lg", "常用对数"),
    SymbolEntry::latex(r"\sin", "正弦"),
    SymbolEntry::latex(r"\cos", "余弦"),
    SymbolEntry::latex(r"\tan", "正切"),
    SymbolEntry::latex(r"\arcsin", "反正弦"),
    SymbolEntry::latex(r"\arccos", "反余弦"),
    SymbolEntry::latex(r"\arctan", "反正切"),
    SymbolEntry::latex(r"\max", "最大值"),
    SymbolEntry::latex(r"\min", "最小值"),
    // Relations
    SymbolEntry::latex(r"\leq", "小于等于"),
    SymbolEntry::latex(r"\geq", "大于等于"),
    SymbolEntry::latex(r"\neq", "不等于"),
    SymbolEntry::latex(r"\approx", "约等于"),
    SymbolEntry::latex(r"\equiv", "恒等于"),
    SymbolEntry::latex(r"\sim", "相似"),
    SymbolEntry::latex(r"\cong", "全等"),
    SymbolEntry::latex(r"\parallel", "平行"),
    SymbolEntry::latex(r"\perp", "垂直"),
    SymbolEntry::latex(r"\in", "属于"),
    SymbolEntry::latex(r"\notin", "不属于"),
    SymbolEntry::latex(r"\subset", "真子集"),
    SymbolEntry::latex(r"\subseteq", "子集"),
    SymbolEntry::latex(r"\supset", "真包含"),
    SymbolEntry::latex(r"\cup", "并集"),
    SymbolEntry::latex(r"\cap", "交集"),
    SymbolEntry::latex(r"\emptyset", "空集"),
    SymbolEntry::latex(r"\forall", "任意"),
    SymbolEntry::latex(r"\exists", "存在"),
    SymbolEntry::latex(r"\Rightarrow", "推出"),
    SymbolEntry::latex(r"\Leftrightarrow", "等价"),
    SymbolEntry::latex(r"\rightarrow", "右箭头"),
    SymbolEntry::latex(r"\to", "趋向"),
    // Binary operators and misc
    SymbolEntry::latex(r"\times", "乘"),
    SymbolEntry::latex(r"\div", "除"),
    SymbolEntry::latex(r"\pm", "正负"),
    SymbolEntry::latex(r"\cdot", "点乘"),
    SymbolEntry::latex(r"\cdots", "居中省略号"),
    SymbolEntry::latex(r"\ldots", "省略号"),
    SymbolEntry::latex(r"\infty", "无穷"),
    SymbolEntry::latex(r"\angle", "角"),
    SymbolEntry::latex(r"\triangle", "三角形"),
    SymbolEntry::latex(r"\circ", "度"),
    SymbolEntry::latex(r"\because", "因为"),
    SymbolEntry::latex(r"\therefore", "所以"),
    // Greek
    SymbolEntry::latex(r"\alpha", "阿尔法"),
    SymbolEntry::latex(r"\beta", "贝塔"),
    SymbolEntry::latex(r"\gamma", "伽马"),
    SymbolEntry::latex(r"\delta", "德尔塔"),
    SymbolEntry::latex(r"\Delta", "大写德尔塔"),
    SymbolEntry::latex(r"\epsilon", "艾普西隆"),
    SymbolEntry::latex(r"\varepsilon", "变体艾普西隆"),
    SymbolEntry::latex(r"\theta", "西塔"),
    SymbolEntry::latex(r"\lambda", "拉姆达"),
    SymbolEntry::latex(r"\mu", "缪"),
    SymbolEntry::latex(r"\pi", "派"),
    SymbolEntry::latex(r"\rho", "肉"),
    SymbolEntry::latex(r"\sigma", "西格马"),
    SymbolEntry::latex(r"\varphi", "斐"),
    SymbolEntry::latex(r"\omega", "欧米伽"),
    SymbolEntry::latex(r"\Omega", "大写欧米伽"),
    // Fonts and text
    SymbolEntry::latex(r"\mathbb{R}", "实数集"),
    SymbolEntry::latex(r"\mathbb{N}", "自然数集"),
    SymbolEntry::latex(r"\mathbb{Z}", "整数集"),
    SymbolEntry::latex(r"\mathbb{Q}", "有理数集"),
    SymbolEntry::latex(r"\mathbf{v}", "粗体"),
    SymbolEntry::latex(r"\mathrm{d}", "正体"),
    SymbolEntry::latex(r"\text{abc}", "文本"),
    SymbolEntry::latex(r"\operatorname{f}", "算子名"),
    // Environments
    SymbolEntry::latex(r"\begin{cases} \end{cases}", "分段函数"),
    SymbolEntry::latex(r"\begin{aligned} \end{aligned}", "对齐"),
    SymbolEntry::latex(r"\begin{matrix} \end{matrix}", "矩阵"),
    SymbolEntry::latex(r"\begin{pmatrix} \end{pmatrix}", "圆括号矩阵"),
    SymbolEntry::latex(r"\begin{array}{cc} \end{array}", "数组"),
    // Markdown
    SymbolEntry::markdown(r"\h1", "一级标题", "# "),
    SymbolEntry::markdown(r"\h2", "二级标题", "## "),
    SymbolEntry::markdown(r"\h3", "三级标题", "### "),
    SymbolEntry::markdown(r"\bold", "加粗", "****"),
    SymbolEntry::markdown(r"\italic", "斜体", "**"),
    SymbolEntry::markdown(r"\code", "行内代码", "``"),
    SymbolEntry::markdown(r"\ul", "无序列表", "- "),
    SymbolEntry::markdown(r"\ol", "有序列表", "1. "),
    SymbolEntry::markdown(r"\quote", "引用", "> "),
    SymbolEntry::markdown(r"\hr", "分割线", "\n---\n"),
    SymbolEntry::markdown(r"\link", "链接", "[]()"),
    // Question bank
    SymbolEntry::question(r"\blank", "填空横线", "______"),
    SymbolEntry::question(r"\bracket", "选择括号", "（  ）"),
    SymbolEntry::question(r"\choice", "四个选项", "A. \nB. \nC. \nD. "),
    SymbolEntry::question(r"\answer", "答案标签", "【答案】"),
    SymbolEntry::question(r"\analysis", "解析标签", "【解析】"),
    SymbolEntry::question(r"\detail", "详解标签", "【详解】"),
    SymbolEntry::question(r"\point", "考点标签", "【考点】"),
];

/// The whole dictionary, in search order.
pub fn dictionary() -> &'static [SymbolEntry] {
    DICTIONARY
}

/// Entries whose trigger starts with `prefix`, in dictionary order.
///
/// A bare `\` matches every entry.
pub fn search_prefix(prefix: &str) -> impl Iterator<Item = &'static SymbolEntry> + '_ {
    DICTIONARY
        .iter()
        .filter(move |entry| entry.trigger.starts_with(prefix))
}

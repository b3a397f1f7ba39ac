//! The two fixed LaTeX templates: a dense one-page resume and a cover letter.
//!
//! Placeholders follow `latex::template`: `{{x}}` escaped, `{{{x}}}` verbatim.
//! Section fragments arrive pre-rendered (and pre-escaped) from the resume
//! formatters, so they use the verbatim form.

pub const RESUME_TEMPLATE: &str = r"\documentclass[11pt,a4paper]{article}
\usepackage[utf8]{inputenc}
\usepackage[T1]{fontenc}
\usepackage[margin=0.6in]{geometry}
\usepackage{enumitem}
\usepackage{titlesec}
\usepackage{xcolor}
\usepackage[hidelinks]{hyperref}

\definecolor{primary}{RGB}{0, 136, 255}
\pagestyle{empty}
\setlength{\parindent}{0pt}
\setlength{\parskip}{2pt}

\titleformat{\section}{\large\bfseries\color{primary}}{}{0em}{}[\vspace{-6pt}\color{primary}\rule{\textwidth}{0.5pt}]
\titlespacing*{\section}{0pt}{8pt}{4pt}

\begin{document}

\begin{center}
  {\Huge\textbf{ {{name}} }} \\[2pt]
  \small {{{contact_line}}}
\end{center}

{{#if summary}}
\section{Professional Summary}
{{{summary}}}
{{/if}}

{{#if education}}
\section{Education}
{{{education}}}
{{/if}}

{{#if skills}}
\section{Technical Skills}
\begin{itemize}[leftmargin=*, noitemsep, topsep=0pt]
{{{skills}}}
\end{itemize}
{{/if}}

{{#if experience}}
\section{Experience}
{{{experience}}}
{{/if}}

{{#if projects}}
\section{Projects}
{{{projects}}}
{{/if}}

\end{document}
";

pub const COVER_LETTER_TEMPLATE: &str = r"\documentclass[11pt,a4paper]{article}
\usepackage[utf8]{inputenc}
\usepackage[T1]{fontenc}
\usepackage[margin=1in]{geometry}
\usepackage{xcolor}
\usepackage[hidelinks]{hyperref}

\pagestyle{empty}
\setlength{\parindent}{0pt}
\setlength{\parskip}{8pt}

\begin{document}

\begin{center}
  {\Large\textbf{ {{name}} }} \\[4pt]
  {{{contact_line}}}
\end{center}
\vspace{12pt}

\today

{{#if hiring_manager}}{{hiring_manager}}{{else}}Hiring Manager{{/if}} \\
{{company}}

Dear {{#if hiring_manager}}{{hiring_manager}}{{else}}Hiring Manager{{/if}},

{{{body}}}

Sincerely,

{{name}}

\end{document}
";

/// Minimal document used by the compiler self-test.
pub const SELF_TEST_DOCUMENT: &str = r"\documentclass{article}
\usepackage[utf8]{inputenc}
\begin{document}
\title{Test Document}
\author{Test Author}
\date{\today}
\maketitle
\section{Introduction}
This is a test document to verify LaTeX compilation.
\end{document}
";

//! Participant-facing Portuguese strings.
//!
//! These texts are part of the observable contract: end-to-end checks match
//! them verbatim, so every screen and error path reads from here.

// ── Form ─────────────────────────────────────────────────────────────────────

pub const HEADER_TITLE: &str = "Encceja 2025";
pub const HEADER_SUBTITLE: &str = "Envie sua nota e concorra a prêmios!";
pub const FORM_INTRO: &str = "Preencha seus dados para validar sua participação:";
pub const CPF_LABEL: &str = "SEU CPF:";
pub const CPF_PLACEHOLDER: &str = "000.000.000-00";
pub const FILE_LABEL: &str = "BOLETIM (FOTO OU PDF):";
pub const FILE_FORMATS: &str = "Formatos aceitos: JPG, PNG, PDF";
pub const FILE_SELECTED: &str = "Arquivo selecionado:";
pub const SUBMIT_BUTTON: &str = "Analisar e Concorrer";
pub const RETRY_PROMPT: &str =
    "Pressione Enter para tentar novamente ou informe outro arquivo:";

// ── Validation and failure messages ──────────────────────────────────────────

pub const CPF_INCOMPLETE: &str = "Por favor, preencha o CPF corretamente.";
pub const FILE_MISSING: &str = "Por favor, anexe o boletim.";
pub const UNSUPPORTED_FILE: &str =
    "Formato de arquivo não suportado. Formatos aceitos: JPG, PNG, PDF";
pub const EMPTY_FILE: &str = "O arquivo selecionado está vazio.";
pub const ANALYSIS_FAILED: &str = "Ocorreu um erro ao analisar o arquivo. Tente novamente.";

// ── Analyzing ────────────────────────────────────────────────────────────────

pub const ANALYZING: &str = "Analisando boletim...";
pub const ANALYZING_DETAIL: &str = "A Inteligência Artificial está lendo suas notas.";

// ── Review ───────────────────────────────────────────────────────────────────

pub const REVIEW_NOTICE: &str =
    "A IA analisou seu print. Verifique se as notas abaixo conferem com o seu boletim.";
pub const REVIEW_TITLE: &str = "Resumo das Notas";
pub const NOT_IDENTIFIED: &str = "Não identificado";
pub const CONFIRM_BUTTON: &str = "CONFIRMAR E ENVIAR";
pub const RETAKE_BUTTON: &str = "A imagem não ficou boa? Tentar novamente";

pub const LABEL_NATURAL_SCIENCES: &str = "Ciências da Natureza";
pub const LABEL_HUMAN_SCIENCES: &str = "Ciências Humanas";
pub const LABEL_LANGUAGES: &str = "Linguagens e Códigos";
pub const LABEL_MATHEMATICS: &str = "Matemática";
pub const LABEL_ESSAY: &str = "Redação";

// ── Submission ───────────────────────────────────────────────────────────────

/// Stored as `nome` when the participant's name could not be read.
pub const NAME_PLACEHOLDER: &str = NOT_IDENTIFIED;
pub const PASSING_TOKEN: &str = "SIM";
pub const FAILING_TOKEN: &str = "NÃO";

// ── Success ──────────────────────────────────────────────────────────────────

pub const SUCCESS_TITLE: &str = "NOTA SALVA!";
pub const SUCCESS_BODY: &str = "Perfeito! Suas notas foram registradas.";
pub const SUCCESS_CALL_TO_ACTION: &str = "Para participar do sorteio dos prêmios, envie o vídeo com sua história e reação ao ver suas notas para este número:";
pub const WHATSAPP_BUTTON: &str = "CHAMAR NO WHATS";
pub const WHATSAPP_URL: &str = "https://bit.ly/Whatsdereações";
pub const SUBMIT_ANOTHER: &str = "Enviar outro boletim";

pub const FOOTER: &str = "© 2025 Termine Seus Estudos. Todos os direitos reservados.";

//! Fixed user-facing strings.

pub const GREETING: &str =
    "Opa! Nekotina na área 😼. Manda texto, foto ou pede pra eu desenhar algo! Bora?";
pub const RESET_GREETING: &str = "Memória formatada! Quem é vc msm? 🤔";

pub const GENERATE_PLACEHOLDER: &str = "🎨 Segura aí, tô pintando essa obra de arte...";
pub const EDIT_PLACEHOLDER: &str = "🖌️ Peraí, tô mexendo na sua foto...";
pub const PROCESSING: &str = "Processando...";

pub const GENERATE_SUCCESS: &str = "Tá na mão chefia! Ficou top? 😎";
pub const GENERATE_EMPTY: &str = "Ih, deu erro na geração da imagem. Tenta outro prompt!";
pub const EDIT_SUCCESS: &str = "Editei aqui, vê se curtiu!";
pub const EDIT_FALLBACK: &str =
    "Não consegui editar a imagem visualmente, mas posso te dizer como ficaria!";
pub const CHAT_FALLBACK: &str = "Buguei aqui...";
pub const CONNECTION_ERROR: &str = "Deu ruim na conexão mn... 🔌 Tenta dnv.";

pub const INPUT_HINT: &str = "Mensagem ou 'Crie um gato...'";
pub const INPUT_HINT_WITH_ATTACHMENT: &str = "Pergunte algo sobre a imagem...";
pub const USAGE_TIP: &str =
    "Dica: Use \"Crie...\" para gerar imagens ou envie uma foto para a Nekotina ver.";

pub mod comissao;
pub mod membro;
pub mod projeto;
pub mod sugestao;
pub mod usuario;

pub use comissao::Comissao;
pub use membro::{Membro, MembroComissaoRow};
pub use projeto::{Projeto, ProjetoComissaoRow};
pub use sugestao::SugestaoIntegracao;
pub use usuario::Usuario;
